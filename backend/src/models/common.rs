use axum::Json;
use serde::Serialize;

/// Success envelope shared by every API endpoint:
/// `{"success": true, "data": ...}`. Errors use the mirror shape built in
/// `error.rs`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<ApiResponse<T>> {
        Json(ApiResponse {
            success: true,
            data,
        })
    }
}

/// One page of a list response.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, size: i64) -> Self {
        let pages = ((total + size - 1) / size).max(1);
        Self {
            items,
            total,
            page,
            size,
            pages,
        }
    }
}

/// Clamps shared by every paginated endpoint: `page` defaults to 1;
/// `size` defaults to 10 and is capped at 100.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub fn clamp_size(size: Option<i64>) -> i64 {
    size.unwrap_or(10).clamp(1, 100)
}

/// Escape LIKE metacharacters so a search term matches literally.
/// Postgres treats backslash as the default LIKE escape character.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// ILIKE pattern matching the term anywhere, or None for a blank search box.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    Some(format!("%{}%", escape_like(term)))
}
