//! Error pages shown to visitors of short links.

use askama::Template;
use askama_web::WebTemplate;

/// Rendered when a token is unknown or its link is disabled.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub token: String,
    pub home_url: String,
}

/// Generic failure page. Never shows error details.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub home_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_page_escapes_token() {
        let page = NotFoundPage {
            token: "<script>".to_string(),
            home_url: "https://s.example.com".to_string(),
        };

        let html = page.render().unwrap();

        assert!(html.contains("&#60;script&#62;") || html.contains("&lt;script&gt;"));
        assert!(html.contains("s.example.com"));
    }

    #[test]
    fn error_page_links_home() {
        let html = ErrorPage {
            home_url: "https://s.example.com".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains("Something went wrong"));
    }
}
