//! Rendering type sets into canonical `package.xml` documents.

use anyhow::{Context, Result, anyhow, bail};
use minijinja::Environment;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use serde::Serialize;

use crate::domain::model::{ApiVersion, TypeSet};

const PACKAGE_TEMPLATE_NAME: &str = "package_xml";
const INDENT_WIDTH: usize = 4;

/// Renders manifests from the built-in package template.
pub struct ManifestRenderer {
    env: Environment<'static>,
}

impl std::fmt::Debug for ManifestRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestRenderer").finish_non_exhaustive()
    }
}

impl ManifestRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(PACKAGE_TEMPLATE_NAME, PACKAGE_TEMPLATE)
            .map_err(|err| anyhow!("failed to register package template: {err}"))?;
        Ok(Self { env })
    }

    /// Render a type set. Types and members come out in ascending order.
    pub fn render(&self, types: &TypeSet, version: ApiVersion) -> Result<String> {
        self.render_members(
            types
                .iter()
                .map(|(name, members)| (name.as_str(), members.iter().map(String::as_str))),
            version,
        )
    }

    /// Render raw `(type, members)` pairs, keeping the caller's type order. Members are sorted
    /// and deduplicated within each type.
    pub fn render_members<'a, I, M>(&self, entries: I, version: ApiVersion) -> Result<String>
    where
        I: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = &'a str>,
    {
        let types = entries
            .into_iter()
            .map(|(name, members)| {
                let mut members: Vec<&str> = members.into_iter().collect();
                members.sort_unstable();
                members.dedup();
                TemplateType {
                    name: escape(name).into_owned(),
                    members: members
                        .into_iter()
                        .map(|member| escape(member).into_owned())
                        .collect(),
                }
            })
            .collect();

        let context = TemplateContext {
            types,
            version: version.to_string(),
        };
        let raw = self
            .env
            .get_template(PACKAGE_TEMPLATE_NAME)
            .and_then(|template| template.render(&context))
            .map_err(|err| anyhow!("failed to render package template: {err}"))?;

        pretty_print(&raw)
    }
}

/// Re-indent an XML document with four spaces per level.
///
/// Whitespace-only text is dropped and elements keep their order, so running the output through
/// this function again yields the same text.
pub fn pretty_print(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => writer
                .write_event(event)
                .context("failed to write XML event")?,
            Err(err) => bail!(
                "cannot pretty-print malformed XML at byte {}: {err}",
                reader.error_position()
            ),
        }
    }

    let mut output =
        String::from_utf8(writer.into_inner()).context("pretty-printed XML is not UTF-8")?;
    output.push('\n');
    Ok(output)
}

#[derive(Serialize)]
struct TemplateContext {
    types: Vec<TemplateType>,
    version: String,
}

#[derive(Serialize)]
struct TemplateType {
    name: String,
    members: Vec<String>,
}

const PACKAGE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="http://soap.sforce.com/2006/04/metadata">
{% for entry in types %}
<types>{% for member in entry.members %}<members>{{ member }}</members>{% endfor %}<name>{{ entry.name }}</name></types>
{% endfor %}
<version>{{ version }}</version>
</Package>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::app::manifest::parse_manifest;

    fn sample() -> TypeSet {
        let mut types = TypeSet::new();
        types.insert_type("ApexTrigger", ["Baz"]);
        types.insert_type("ApexClass", ["Foo", "Bar"]);
        types
    }

    #[test]
    fn renders_sorted_types_and_members() {
        let renderer = ManifestRenderer::new().unwrap();
        let xml = renderer.render(&sample(), ApiVersion::new(52)).unwrap();

        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="http://soap.sforce.com/2006/04/metadata">
    <types>
        <members>Bar</members>
        <members>Foo</members>
        <name>ApexClass</name>
    </types>
    <types>
        <members>Baz</members>
        <name>ApexTrigger</name>
    </types>
    <version>52.0</version>
</Package>
"#;
        assert_eq!(xml, expected);
    }

    #[test]
    fn render_members_keeps_caller_type_order() {
        let renderer = ManifestRenderer::new().unwrap();
        let xml = renderer
            .render_members(
                [("Workflow", vec!["b", "a"]), ("ApexClass", vec!["*"])],
                ApiVersion::new(60),
            )
            .unwrap();

        let workflow = xml.find("<name>Workflow</name>").unwrap();
        let apex = xml.find("<name>ApexClass</name>").unwrap();
        assert!(workflow < apex);
        assert!(xml.find("<members>a</members>").unwrap() < xml.find("<members>b</members>").unwrap());
        assert!(xml.contains("<version>60.0</version>"));
    }

    #[test]
    fn escapes_member_names() {
        let renderer = ManifestRenderer::new().unwrap();
        let mut types = TypeSet::new();
        types.insert_type("Report", ["Sales & Ops/Pipeline"]);
        let xml = renderer.render(&types, ApiVersion::new(52)).unwrap();

        assert!(xml.contains("<members>Sales &amp; Ops/Pipeline</members>"));
        assert_eq!(parse_manifest(xml.as_bytes()).unwrap(), types);
    }

    #[test]
    fn rendered_output_round_trips_through_parser() {
        let renderer = ManifestRenderer::new().unwrap();
        let xml = renderer.render(&sample(), ApiVersion::new(52)).unwrap();
        assert_eq!(parse_manifest(xml.as_bytes()).unwrap(), sample());
    }

    #[test]
    fn pretty_print_is_idempotent() {
        let messy = r#"<?xml version="1.0" encoding="UTF-8"?>
            <Package xmlns="http://soap.sforce.com/2006/04/metadata"><types>
              <members>Foo</members>   <name>ApexClass</name></types>
                <version>52.0</version>
            </Package>"#;
        let once = pretty_print(messy).unwrap();
        let twice = pretty_print(&once).unwrap();
        assert_eq!(once, twice);
        assert!(once.contains("\n    <types>\n        <members>Foo</members>\n"));
    }

    #[test]
    fn pretty_print_rejects_malformed_input() {
        assert!(pretty_print("<Package><types></Package>").is_err());
    }
}
