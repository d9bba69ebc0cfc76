use handlebars::{Handlebars, TemplateError};

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name, ".hbs")))
    };
}

const PAGES: &[(&str, &str)] = &[
    template!("index"),
    template!("registration"),
    template!("login"),
    template!("profile"),
    template!("profile_form"),
    template!("review_form"),
    template!("confirm_delete"),
    template!("error"),
    template!("field_list"),
    template!("field_detail"),
    template!("field_form"),
    template!("crop_list"),
    template!("crop_detail"),
    template!("crop_form"),
    template!("activity_list"),
    template!("activity_detail"),
    template!("activity_form"),
    template!("weather_list"),
    template!("weather_detail"),
    template!("weather_form"),
    template!("route_list"),
    template!("route_detail"),
    template!("route_form"),
    template!("post_list"),
    template!("post_detail"),
    template!("post_form"),
];

const PARTIALS: &[(&str, &str)] = &[template!("layout"), template!("field_errors")];

/// Compiles every page and partial once at startup.
pub fn registry() -> Result<Handlebars<'static>, TemplateError> {
    let mut registry = Handlebars::new();
    for (name, source) in PARTIALS {
        registry.register_partial(name, *source)?;
    }
    for (name, source) in PAGES {
        registry.register_template_string(name, *source)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_templates_compile() {
        let registry = registry().unwrap();
        for (name, _) in PAGES {
            assert!(registry.has_template(name), "{name} missing");
        }
    }

    #[test]
    fn error_page_escapes_message() {
        let registry = registry().unwrap();
        let page = registry
            .render(
                "error",
                &json!({"title": "Not Found", "code": 404, "message": "<b>Field</b> not found"}),
            )
            .unwrap();
        assert!(page.contains("&lt;b&gt;Field&lt;/b&gt; not found"));
        assert!(page.contains("(404)"));
    }

    #[test]
    fn layout_shows_review_modal_only_when_flagged() {
        let registry = registry().unwrap();
        let shown = registry
            .render(
                "index",
                &json!({"title": "Home", "user": {"username": "farmer_a"}, "show_review_modal": true}),
            )
            .unwrap();
        assert!(shown.contains("id=\"review-modal\""));

        let hidden = registry
            .render(
                "index",
                &json!({"title": "Home", "user": {"username": "farmer_a"}, "show_review_modal": false}),
            )
            .unwrap();
        assert!(!hidden.contains("id=\"review-modal\""));
    }
}
