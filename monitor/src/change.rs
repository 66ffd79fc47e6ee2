//! Rendering of surface texts and fingerprint based change detection.

use crate::target::Surface;
use log::error;
use serde_json::Value;
use shared::{truncate_with_ellipsis, Fingerprint, Renderer, DESCRIPTION_LIMIT};

/// Name and description of a surface as they would be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSurface {
    pub name: String,
    pub description: String,
}

impl RenderedSurface {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.name, &self.description)
    }
}

/// Outcome of comparing a rendered surface with the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Same fingerprint as the last successful apply
    Unchanged,
    Changed(Fingerprint),
    /// Nothing rendered, there is nothing to apply
    Empty,
}

/// Renders both templates of `surface`.
///
/// A template that fails to render leaves its field empty; the other field is
/// still rendered. Descriptions are truncated to [`DESCRIPTION_LIMIT`]
/// characters so that texts which only differ past the limit compare equal.
pub fn render_surface(renderer: &Renderer, surface: &Surface, context: &Value, server: &str) -> RenderedSurface {
    let render = |template: Option<&String>, field: &str| -> String {
        let Some(template) = template else {
            return String::new();
        };
        match renderer.render_value(template, context) {
            Ok(text) => text,
            Err(e) => {
                error!(
                    "server={} surface={} failed to render {} {}: {}",
                    server, surface.id, surface.kind, field, e
                );
                String::new()
            }
        }
    };

    let name = render(surface.name_template.as_ref(), "name");
    let description = render(surface.description_template.as_ref(), "description");

    RenderedSurface {
        name,
        description: truncate_with_ellipsis(&description, DESCRIPTION_LIMIT),
    }
}

/// Compares `rendered` with the fingerprint of the last successful apply.
pub fn detect(rendered: &RenderedSurface, previous: Option<Fingerprint>) -> Change {
    if rendered.is_empty() {
        return Change::Empty;
    }

    let fingerprint = rendered.fingerprint();
    if previous == Some(fingerprint) {
        Change::Unchanged
    } else {
        Change::Changed(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::SurfaceKind;
    use serde_json::json;

    fn surface(name: Option<&str>, description: Option<&str>) -> Surface {
        Surface::configured(SurfaceKind::Primary, Some("42"), name, description).unwrap()
    }

    #[test]
    fn test_render_both_fields() {
        let renderer = Renderer::new();
        let context = json!({ "ID": "main", "Info": { "Players": 3, "MaxPlayers": 10 } });
        let surface = surface(
            Some("{{ .Info.Players }}/{{ .Info.MaxPlayers }}"),
            Some("Server {{ .ID }}"),
        );

        let rendered = render_surface(&renderer, &surface, &context, "main");
        assert_eq!(rendered.name, "3/10");
        assert_eq!(rendered.description, "Server main");
    }

    #[test]
    fn test_render_failure_degrades_single_field() {
        let renderer = Renderer::new();
        let context = json!({ "ID": "main" });
        let surface = surface(Some("{{ NoSuchHelper .ID }}"), Some("ok {{ .ID }}"));

        let rendered = render_surface(&renderer, &surface, &context, "main");
        assert_eq!(rendered.name, "");
        assert_eq!(rendered.description, "ok main");
    }

    #[test]
    fn test_description_truncated_name_untouched() {
        let renderer = Renderer::new();
        let long = "x".repeat(DESCRIPTION_LIMIT + 200);
        let context = json!({ "Long": long });
        let surface = surface(Some("{{ .Long }}"), Some("{{ .Long }}"));

        let rendered = render_surface(&renderer, &surface, &context, "main");
        assert_eq!(rendered.name.chars().count(), DESCRIPTION_LIMIT + 200);
        assert_eq!(rendered.description.chars().count(), DESCRIPTION_LIMIT);
        assert!(rendered.description.ends_with("..."));
    }

    #[test]
    fn test_truncated_equal_descriptions_are_unchanged() {
        let renderer = Renderer::new();
        let surface = surface(None, Some("{{ .Text }}"));
        let prefix = "y".repeat(DESCRIPTION_LIMIT);

        let first = render_surface(&renderer, &surface, &json!({ "Text": format!("{}aaa", prefix) }), "s");
        let second = render_surface(&renderer, &surface, &json!({ "Text": format!("{}bbb", prefix) }), "s");

        let Change::Changed(fingerprint) = detect(&first, None) else {
            panic!("first render must be a change");
        };
        assert_eq!(detect(&second, Some(fingerprint)), Change::Unchanged);
    }

    #[test]
    fn test_detect() {
        let rendered = RenderedSurface {
            name: "a".to_string(),
            description: "b".to_string(),
        };
        let fingerprint = rendered.fingerprint();

        assert_eq!(detect(&rendered, None), Change::Changed(fingerprint));
        assert_eq!(detect(&rendered, Some(fingerprint)), Change::Unchanged);
        assert_eq!(detect(&rendered, Some(Fingerprint(0))), Change::Changed(fingerprint));
        assert_eq!(detect(&RenderedSurface::default(), None), Change::Empty);
    }
}
