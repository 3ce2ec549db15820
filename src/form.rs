//! Encodes an HTML form submission the way a browser would, without running
//! any script: successful controls are gathered in document order, the
//! requested field actions are applied, and the clicked submit control is
//! added last in its own position.

use once_cell::sync::Lazy;
use reqwest::Method;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::FetchError;
use crate::fetcher::{ClickTarget, Document, FormField};

static FORM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
static CONTROL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea, button").unwrap());
static OPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("option").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub method: Method,
    pub action: Url,
    pub pairs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlKind {
    Text,
    Checkable,
    Button,
    Ignored,
}

#[derive(Debug, Clone)]
struct Control {
    kind: ControlKind,
    id: Option<String>,
    name: Option<String>,
    value: String,
    checked: bool,
    disabled: bool,
    clicked: bool,
}

impl Control {
    fn from_element(el: ElementRef<'_>) -> Self {
        let attrs = el.value();
        let tag = attrs.name();
        let input_type = attrs
            .attr("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| if tag == "button" { "submit".into() } else { "text".into() });

        let kind = match tag {
            "textarea" | "select" => ControlKind::Text,
            _ => match input_type.as_str() {
                "checkbox" | "radio" => ControlKind::Checkable,
                "submit" | "image" => ControlKind::Button,
                "reset" | "file" | "button" => ControlKind::Ignored,
                _ => ControlKind::Text,
            },
        };

        let value = match tag {
            "textarea" => el.text().collect::<String>(),
            "select" => selected_option(el),
            _ => attrs
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| match kind {
                    ControlKind::Checkable => "on".to_string(),
                    _ => String::new(),
                }),
        };

        Self {
            kind,
            id: attrs.attr("id").map(str::to_string),
            name: attrs.attr("name").map(str::to_string),
            value,
            checked: attrs.attr("checked").is_some(),
            disabled: attrs.attr("disabled").is_some(),
            clicked: false,
        }
    }

    fn answers_to(&self, field: &str) -> bool {
        self.id.as_deref() == Some(field) || self.name.as_deref() == Some(field)
    }

    fn is_successful(&self) -> bool {
        if self.disabled {
            return false;
        }
        match self.kind {
            ControlKind::Text => true,
            ControlKind::Checkable => self.checked,
            ControlKind::Button => self.clicked,
            ControlKind::Ignored => false,
        }
    }
}

fn selected_option(select: ElementRef<'_>) -> String {
    let mut options = select.select(&OPTION_SELECTOR);
    let chosen = select
        .select(&OPTION_SELECTOR)
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.next());

    chosen
        .map(|o| {
            o.value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| o.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}

fn form_controls(form: ElementRef<'_>) -> Vec<Control> {
    form.select(&CONTROL_SELECTOR).map(Control::from_element).collect()
}

/// Builds the request a browser would send after applying `fields` and
/// clicking `click` on the form that owns the first addressed field.
pub fn build_submission(
    document: &Document,
    fields: &[FormField],
    click: &ClickTarget,
) -> Result<FormSubmission, FetchError> {
    let html = Html::parse_document(&document.html);
    let ClickTarget::Value(click_value) = click;

    let owns = |form: &ElementRef<'_>| {
        let controls = form_controls(*form);
        match fields.first() {
            Some(first) => controls.iter().any(|c| c.answers_to(first.field())),
            None => controls
                .iter()
                .any(|c| c.kind == ControlKind::Button && c.value == *click_value),
        }
    };

    let form = html.select(&FORM_SELECTOR).find(|f| owns(f)).ok_or_else(|| {
        let wanted = fields
            .first()
            .map(|f| f.field().to_string())
            .unwrap_or_else(|| format!("[value='{}']", click_value));
        FetchError::selector_missing(&document.url, wanted)
    })?;

    let mut controls = form_controls(form);

    for field in fields {
        match field {
            FormField::Text { field, value } => {
                let control = controls
                    .iter_mut()
                    .find(|c| c.kind == ControlKind::Text && c.answers_to(field))
                    .ok_or_else(|| FetchError::selector_missing(&document.url, field))?;
                control.value = value.clone();
            }
            FormField::Toggle { field } => {
                let control = controls
                    .iter_mut()
                    .find(|c| c.kind == ControlKind::Checkable && c.answers_to(field))
                    .ok_or_else(|| FetchError::selector_missing(&document.url, field))?;
                control.checked = !control.checked;
            }
        }
    }

    let submit = controls
        .iter_mut()
        .find(|c| c.kind == ControlKind::Button && c.value == *click_value)
        .ok_or_else(|| {
            FetchError::selector_missing(&document.url, format!("[value='{}']", click_value))
        })?;
    submit.clicked = true;

    let pairs = controls
        .iter()
        .filter(|c| c.is_successful())
        .filter_map(|c| c.name.clone().map(|name| (name, c.value.clone())))
        .collect();

    let base = Url::parse(&document.url).map_err(|e| FetchError::fetch(&document.url, e))?;
    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base
            .join(action)
            .map_err(|e| FetchError::fetch(&document.url, e))?,
        _ => base,
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
        _ => Method::GET,
    };

    Ok(FormSubmission {
        method,
        action,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><head><title>sf bay area jobs</title></head><body>
        <form id="searchform" action="/search/jjj" method="get">
            <input type="hidden" name="areaID" value="1">
            <input id="query" name="query" type="text" value="">
            <select name="srchType">
                <option value="A">entire post</option>
                <option value="T" selected>titles only</option>
            </select>
            <input type="checkbox" name="addOne" value="telecommuting"> telecommute
            <input type="checkbox" name="addTwo" value="contract"> contract
            <input type="submit" value="Search">
        </form>
        </body></html>
    "#;

    fn search_page() -> Document {
        Document::new("http://sfbay.craigslist.org/jjj/", SEARCH_PAGE)
    }

    fn pairs(s: &FormSubmission) -> Vec<(&str, &str)> {
        s.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn fills_query_and_resolves_action() {
        let sub = build_submission(
            &search_page(),
            &[FormField::text("query", "qa")],
            &ClickTarget::value("Search"),
        )
        .unwrap();

        assert_eq!(sub.method, Method::GET);
        assert_eq!(sub.action.as_str(), "http://sfbay.craigslist.org/search/jjj");
        assert_eq!(
            pairs(&sub),
            vec![("areaID", "1"), ("query", "qa"), ("srchType", "T")]
        );
    }

    #[test]
    fn toggle_checks_telecommute_box() {
        let sub = build_submission(
            &search_page(),
            &[FormField::text("query", "qa"), FormField::toggle("addOne")],
            &ClickTarget::value("Search"),
        )
        .unwrap();

        assert!(sub.pairs.contains(&("addOne".to_string(), "telecommuting".to_string())));
        assert!(!sub.pairs.iter().any(|(k, _)| k == "addTwo"));
    }

    #[test]
    fn toggle_unchecks_a_prechecked_box() {
        let html = r#"<form><input id="query" name="query">
            <input type="checkbox" name="addOne" checked>
            <input type="submit" value="Search"></form>"#;
        let doc = Document::new("http://x.org/jjj/", html);
        let sub = build_submission(
            &doc,
            &[FormField::text("query", "qa"), FormField::toggle("addOne")],
            &ClickTarget::value("Search"),
        )
        .unwrap();
        assert_eq!(pairs(&sub), vec![("query", "qa")]);
    }

    #[test]
    fn named_submit_control_is_sent() {
        let html = r#"<form method="POST" action="results"><input id="query" name="query">
            <input type="submit" name="go" value="Search"></form>"#;
        let doc = Document::new("http://x.org/jjj/", html);
        let sub = build_submission(
            &doc,
            &[FormField::text("query", "rust")],
            &ClickTarget::value("Search"),
        )
        .unwrap();
        assert_eq!(sub.method, Method::POST);
        assert_eq!(sub.action.as_str(), "http://x.org/jjj/results");
        assert_eq!(pairs(&sub), vec![("query", "rust"), ("go", "Search")]);
    }

    #[test]
    fn disabled_controls_are_not_sent() {
        let html = r#"<form><input id="query" name="query">
            <input type="hidden" name="secret" value="x" disabled>
            <select name="area" disabled><option value="sf">sf</option></select>
            <input type="submit" value="Search"></form>"#;
        let doc = Document::new("http://x.org/jjj/", html);
        let sub = build_submission(
            &doc,
            &[FormField::text("query", "qa")],
            &ClickTarget::value("Search"),
        )
        .unwrap();
        assert_eq!(pairs(&sub), vec![("query", "qa")]);
    }

    #[test]
    fn missing_query_field_is_reported() {
        let doc = Document::new("http://x.org/jjj/", "<form><input name='q'></form>");
        let err = build_submission(
            &doc,
            &[FormField::text("query", "qa")],
            &ClickTarget::value("Search"),
        )
        .unwrap_err();
        assert_eq!(err, FetchError::selector_missing("http://x.org/jjj/", "query"));
    }

    #[test]
    fn missing_checkbox_is_reported() {
        let html = r#"<form><input id="query"><input type="submit" value="Search"></form>"#;
        let doc = Document::new("http://x.org/jjj/", html);
        let err = build_submission(
            &doc,
            &[FormField::text("query", "qa"), FormField::toggle("addOne")],
            &ClickTarget::value("Search"),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::SelectorMissing { ref selector, .. } if selector == "addOne"));
    }

    #[test]
    fn missing_submit_control_is_reported() {
        let html = r#"<form><input id="query" name="query"><input type="submit" value="Go"></form>"#;
        let doc = Document::new("http://x.org/jjj/", html);
        let err = build_submission(
            &doc,
            &[FormField::text("query", "qa")],
            &ClickTarget::value("Search"),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::SelectorMissing { .. }));
    }
}
