use crate::tpl::Segment;
use crate::tpl::parser::parse_template;
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};

/// Upper bound on distinct cached templates; batch statements vary with row count.
const MAX_CACHED_TEMPLATES: usize = 4096;

/// 缓存模板解析结果，以模板文本为键
pub(crate) static TEMPLATE_CACHE: LazyLock<DashMap<String, Arc<Vec<Segment>>>> =
    LazyLock::new(DashMap::new);

pub(crate) fn get_segments(template: &str) -> Arc<Vec<Segment>> {
    if let Some(cached) = TEMPLATE_CACHE.get(template) {
        return cached.clone();
    }

    let segments = Arc::new(parse_template(template));
    if TEMPLATE_CACHE.len() < MAX_CACHED_TEMPLATES {
        TEMPLATE_CACHE.insert(template.to_string(), segments.clone());
    }
    segments
}
