//! Template placeholder injection.
//!
//! The template is plain HTML text; injection is non-recursive pattern
//! substitution over the whole buffer, first match only. Field values are
//! trusted to already be render-safe — no escaping happens here.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, instrument};

use reportdesk_shared::{
    Fragment, ReportDeskError, Result, SectionEntry, format_metadata_datetime,
    parse_fragment_timestamp, section_prefix,
};

/// Placeholder conventions the template follows.
#[derive(Debug, Clone)]
pub struct InjectOptions<'a> {
    /// Prefix marking an untouched field placeholder region.
    pub empty_marker: &'a str,
    /// Text shown by an unset `<prefix>-author` span.
    pub author_placeholder: &'a str,
    /// Text shown by an unset `<prefix>-date` span.
    pub date_placeholder: &'a str,
    /// Section table resolving sectionId → metadata-span prefix.
    pub sections: &'a [SectionEntry],
}

/// Merge fragment data into the template text.
///
/// For every field across all fragments, the element with
/// `id="<fieldId>-view"` whose inner content still begins with the
/// empty-state marker has that content replaced by the field value. For
/// every fragment carrying both author and timestamp, the section's
/// `<prefix>-author` / `<prefix>-date` spans are filled in. Placeholders
/// absent from the template are not an error; an unparsable timestamp is.
///
/// Returns a new buffer; the input template is untouched.
#[instrument(skip_all, fields(fragments = fragments.len()))]
pub fn inject(
    template: &str,
    fragments: &BTreeMap<String, Fragment>,
    opts: &InjectOptions<'_>,
) -> Result<String> {
    let mut html = template.to_string();

    for fragment in fragments.values() {
        for (field_id, value) in &fragment.fields {
            html = inject_field(html, field_id, value, opts.empty_marker)?;
        }

        if let Some((author, timestamp)) = fragment.metadata() {
            let parsed = parse_fragment_timestamp(timestamp).map_err(|e| {
                ReportDeskError::parse(format!(
                    "section {}: {e}",
                    fragment.section_id
                ))
            })?;
            let date = format_metadata_datetime(&parsed);
            let prefix = section_prefix(opts.sections, &fragment.section_id);

            html = html.replacen(
                &format!(
                    r#"<span id="{prefix}-author">{}</span>"#,
                    opts.author_placeholder
                ),
                &format!(r#"<span id="{prefix}-author">{author}</span>"#),
                1,
            );
            html = html.replacen(
                &format!(
                    r#"<span id="{prefix}-date">{}</span>"#,
                    opts.date_placeholder
                ),
                &format!(r#"<span id="{prefix}-date">{date}</span>"#),
                1,
            );

            debug!(
                section = %fragment.section_id,
                prefix,
                "metadata spans updated"
            );
        }
    }

    Ok(html)
}

/// Replace one field's placeholder region, if it is still in its empty state.
fn inject_field(html: String, field_id: &str, value: &str, empty_marker: &str) -> Result<String> {
    let pattern = format!(
        r#"(?s)(<div[^>]*\bid="{id}-view"[^>]*>)(.*?)(</div>)"#,
        id = regex::escape(field_id)
    );
    let re = Regex::new(&pattern)
        .map_err(|e| ReportDeskError::validation(format!("field pattern {field_id}: {e}")))?;

    let Some(caps) = re.captures(&html) else {
        // The template simply has no region for this field.
        return Ok(html);
    };
    let Some(inner) = caps.get(2) else {
        return Ok(html);
    };

    if !inner.as_str().trim_start().starts_with(empty_marker) {
        // Already filled, or a non-placeholder element sharing the id scheme.
        return Ok(html);
    }

    let mut out = String::with_capacity(html.len() + value.len());
    out.push_str(&html[..inner.start()]);
    out.push_str(value);
    out.push_str(&html[inner.end()..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<SectionEntry> {
        vec![SectionEntry {
            id: "executive-summary".into(),
            prefix: "exec".into(),
            title: "Executive summary".into(),
        }]
    }

    fn opts(sections: &[SectionEntry]) -> InjectOptions<'_> {
        InjectOptions {
            empty_marker: "[Enter",
            author_placeholder: "Not recorded",
            date_placeholder: "-",
            sections,
        }
    }

    fn fragment(section_id: &str, fields: &[(&str, &str)]) -> Fragment {
        Fragment {
            section_id: section_id.into(),
            author: None,
            timestamp: None,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn fragments(items: Vec<Fragment>) -> BTreeMap<String, Fragment> {
        items
            .into_iter()
            .map(|f| (f.section_id.clone(), f))
            .collect()
    }

    #[test]
    fn field_value_replaces_empty_region() {
        let template = r#"<div id="risk-view">[Enter value]</div>"#;
        let table = table();
        let out = inject(
            template,
            &fragments(vec![fragment("action-plan", &[("risk", "High")])]),
            &opts(&table),
        )
        .unwrap();
        assert_eq!(out, r#"<div id="risk-view">High</div>"#);
    }

    #[test]
    fn untouched_fields_keep_placeholder_text() {
        let template = concat!(
            r#"<div id="risk-view">[Enter value]</div>"#,
            r#"<div id="budget-view">[Enter value]</div>"#,
        );
        let table = table();
        let out = inject(
            template,
            &fragments(vec![fragment("action-plan", &[("risk", "High")])]),
            &opts(&table),
        )
        .unwrap();
        assert!(out.contains(r#"<div id="budget-view">[Enter value]</div>"#));
    }

    #[test]
    fn already_filled_region_is_left_alone() {
        let template = r#"<div id="risk-view">Low</div>"#;
        let table = table();
        let out = inject(
            template,
            &fragments(vec![fragment("action-plan", &[("risk", "High")])]),
            &opts(&table),
        )
        .unwrap();
        assert_eq!(out, template);
    }

    #[test]
    fn multiline_region_is_replaced_whole() {
        let template = "<div class=\"field\" id=\"risk-view\">\n  [Enter value]\n</div>";
        let table = table();
        let out = inject(
            template,
            &fragments(vec![fragment("action-plan", &[("risk", "High")])]),
            &opts(&table),
        )
        .unwrap();
        assert_eq!(out, "<div class=\"field\" id=\"risk-view\">High</div>");
    }

    #[test]
    fn metadata_spans_fill_via_prefix_table() {
        let template = concat!(
            r#"<span id="exec-author">Not recorded</span>"#,
            r#"<span id="exec-date">-</span>"#,
        );
        let mut f = fragment("executive-summary", &[]);
        f.author = Some("A. Kowalski".into());
        f.timestamp = Some("2024-03-15T09:30:00".into());

        let table = table();
        let out = inject(template, &fragments(vec![f]), &opts(&table)).unwrap();
        assert!(out.contains(r#"<span id="exec-author">A. Kowalski</span>"#));
        assert!(out.contains(r#"<span id="exec-date">2024-03-15 09:30</span>"#));
    }

    #[test]
    fn unparsable_timestamp_is_a_hard_error() {
        let mut f = fragment("executive-summary", &[]);
        f.author = Some("A".into());
        f.timestamp = Some("not-a-date".into());

        let table = table();
        let err = inject("<html></html>", &fragments(vec![f]), &opts(&table)).unwrap_err();
        assert!(err.to_string().contains("executive-summary"));
    }

    #[test]
    fn missing_metadata_spans_are_not_an_error() {
        let mut f = fragment("executive-summary", &[]);
        f.author = Some("A".into());
        f.timestamp = Some("2024-03-15T09:30:00".into());

        let table = table();
        let out = inject("<html></html>", &fragments(vec![f]), &opts(&table)).unwrap();
        assert_eq!(out, "<html></html>");
    }

    #[test]
    fn fixture_template_fills_fields_and_metadata() {
        let template =
            std::fs::read_to_string("../../../fixtures/template/report_template.html")
                .expect("read template fixture");
        let body = std::fs::read_to_string("../../../fixtures/json/fragment.fixture.json")
            .expect("read fragment fixture");
        let f: Fragment = serde_json::from_str(&body).expect("parse fixture");

        let table = table();
        let out = inject(&template, &fragments(vec![f]), &opts(&table)).unwrap();

        assert!(out.contains("Data quality improved quarter over quarter."));
        assert!(out.contains(r#"<span id="exec-author">A. Kowalski</span>"#));
        assert!(out.contains(r#"<span id="exec-date">2024-03-15 09:30</span>"#));
        // The uncontributed summary section keeps its placeholders.
        assert!(out.contains(r#"<div class="field-value" id="conclusion-view">[Enter value]</div>"#));
        assert!(out.contains(r#"<span id="sum-author">Not recorded</span>"#));
    }

    #[test]
    fn input_template_is_not_mutated() {
        let template = r#"<div id="risk-view">[Enter value]</div>"#.to_string();
        let table = table();
        let _ = inject(
            &template,
            &fragments(vec![fragment("action-plan", &[("risk", "High")])]),
            &opts(&table),
        )
        .unwrap();
        assert!(template.contains("[Enter value]"));
    }
}
