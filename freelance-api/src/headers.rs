//! Alert, error and pagination response headers.

use axum::http::header::{HeaderName, HeaderValue, LINK};
use axum::http::{HeaderMap, Uri};
use freelance_core::storage::Page;
use std::sync::OnceLock;

pub const TOTAL_COUNT: &str = "x-total-count";
const DEFAULT_APP_NAME: &str = "freelanceApp";

static APP_NAME: OnceLock<String> = OnceLock::new();

/// Sets the prefix used in `X-<app>-*` headers. Only the first call has effect.
pub fn set_app_name(name: &str) {
    let _ = APP_NAME.set(name.to_string());
}

pub fn app_name() -> &'static str {
    APP_NAME.get().map(String::as_str).unwrap_or(DEFAULT_APP_NAME)
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        headers.insert(name, value);
    }
}

fn alert(entity: &str, action: &str, param: &str) -> HeaderMap {
    let app = app_name();
    let mut headers = HeaderMap::new();
    insert(&mut headers, &format!("x-{app}-alert"), &format!("{app}.{entity}.{action}"));
    insert(&mut headers, &format!("x-{app}-params"), param);
    headers
}

pub fn created_alert(entity: &str, id: impl ToString) -> HeaderMap {
    alert(entity, "created", &id.to_string())
}

pub fn updated_alert(entity: &str, id: impl ToString) -> HeaderMap {
    alert(entity, "updated", &id.to_string())
}

pub fn deleted_alert(entity: &str, id: impl ToString) -> HeaderMap {
    alert(entity, "deleted", &id.to_string())
}

pub fn failure_alert(entity: &str, key: &str) -> HeaderMap {
    let app = app_name();
    let mut headers = HeaderMap::new();
    insert(&mut headers, &format!("x-{app}-error"), &format!("error.{key}"));
    insert(&mut headers, &format!("x-{app}-params"), entity);
    headers
}

/// `X-Total-Count` and RFC 5988 `Link` headers for one page of `uri`.
pub fn pagination<T>(uri: &Uri, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT, HeaderValue::from(page.total));

    let last = page.total_pages().saturating_sub(1);
    let mut links = Vec::new();
    if page.page < last {
        links.push(link(uri, page.page + 1, page.size, "next"));
    }
    if page.page > 0 {
        links.push(link(uri, page.page - 1, page.size, "prev"));
    }
    links.push(link(uri, last, page.size, "last"));
    links.push(link(uri, 0, page.size, "first"));

    if let Ok(value) = HeaderValue::from_str(&links.join(",")) {
        headers.insert(LINK, value);
    }
    headers
}

fn link(uri: &Uri, page: u64, size: u64, rel: &str) -> String {
    let mut query: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let key = p.split('=').next().unwrap_or_default();
            key != "page" && key != "size"
        })
        .map(String::from)
        .collect();
    query.push(format!("page={page}"));
    query.push(format!("size={size}"));
    format!("<{}?{}>; rel=\"{rel}\"", uri.path(), query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u64, page: u64, size: u64) -> Page<()> {
        Page {
            content: vec![],
            total,
            page,
            size,
        }
    }

    #[test]
    fn alert_headers_use_app_prefix() {
        let headers = created_alert("offer", 7);
        assert_eq!(headers["x-freelanceapp-alert"], "freelanceApp.offer.created");
        assert_eq!(headers["x-freelanceapp-params"], "7");

        let failure = failure_alert("offer", "notOfferOwner");
        assert_eq!(failure["x-freelanceapp-error"], "error.notOfferOwner");
    }

    #[test]
    fn middle_page_links_all_relations() {
        let uri: Uri = "/api/tags?name.contains=a&page=1&size=10".parse().unwrap();
        let headers = pagination(&uri, &page(35, 1, 10));

        assert_eq!(headers[TOTAL_COUNT], "35");
        let link = headers[LINK].to_str().unwrap();
        assert_eq!(
            link,
            "</api/tags?name.contains=a&page=2&size=10>; rel=\"next\",\
             </api/tags?name.contains=a&page=0&size=10>; rel=\"prev\",\
             </api/tags?name.contains=a&page=3&size=10>; rel=\"last\",\
             </api/tags?name.contains=a&page=0&size=10>; rel=\"first\""
        );
    }

    #[test]
    fn empty_result_has_only_first_and_last() {
        let uri: Uri = "/api/tags".parse().unwrap();
        let headers = pagination(&uri, &page(0, 0, 20));
        let link = headers[LINK].to_str().unwrap();
        assert!(!link.contains("next"));
        assert!(!link.contains("prev"));
        assert!(link.contains("</api/tags?page=0&size=20>; rel=\"last\""));
    }
}
