//! GEXF export of the permission nesting graph

use std::fmt::Write as _;
use std::path::Path;

use capmig_core::PermissionAnalysis;

use crate::error::Result;

/// Renders the classified permission graph as GEXF 1.2: one node per
/// classified name (category as attribute), one directed edge per
/// declared sub-permission reference.
pub fn render(analysis: &PermissionAnalysis) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<gexf xmlns=\"http://www.gexf.net/1.2draft\" version=\"1.2\">\n");
    out.push_str("  <graph mode=\"static\" defaultedgetype=\"directed\">\n");
    out.push_str("    <attributes class=\"node\">\n");
    out.push_str("      <attribute id=\"0\" title=\"category\" type=\"string\"/>\n");
    out.push_str("    </attributes>\n");

    out.push_str("    <nodes>\n");
    for entry in analysis.iter() {
        let _ = writeln!(
            out,
            "      <node id=\"{id}\" label=\"{label}\">\n        \
             <attvalues><attvalue for=\"0\" value=\"{category}\"/></attvalues>\n      </node>",
            id = escape(&entry.name),
            label = escape(entry.display_name().unwrap_or(&entry.name)),
            category = entry.category,
        );
    }
    out.push_str("    </nodes>\n");

    out.push_str("    <edges>\n");
    let mut edge_id = 0usize;
    for entry in analysis.iter() {
        for sub in entry.sub_permission_union() {
            // Dangling references stay out of the graph; they are
            // already reported through the expansion's unknown list.
            if analysis.get(&sub).is_none() {
                continue;
            }
            let _ = writeln!(
                out,
                "      <edge id=\"{edge_id}\" source=\"{source}\" target=\"{target}\"/>",
                source = escape(&entry.name),
                target = escape(&sub),
            );
            edge_id += 1;
        }
    }
    out.push_str("    </edges>\n");

    out.push_str("  </graph>\n</gexf>\n");
    out
}

pub fn write(path: &Path, analysis: &PermissionAnalysis) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render(analysis))?;
    Ok(())
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use capmig_core::{Classifier, PermissionRecord};

    fn analysis() -> PermissionAnalysis {
        let records = vec![
            PermissionRecord::new("perms.root")
                .mutable(true)
                .with_display_name("Root <set>")
                .with_sub_permissions(["perms.leaf", "perms.ghost"]),
            PermissionRecord::new("perms.leaf"),
        ];
        Classifier::new().classify(&records, &records, &[])
    }

    #[test]
    fn test_render_contains_nodes_and_edges() {
        let xml = render(&analysis());
        assert!(xml.contains("<node id=\"perms.root\""));
        assert!(xml.contains("value=\"mutable\""));
        assert!(xml.contains("source=\"perms.root\" target=\"perms.leaf\""));
    }

    #[test]
    fn test_dangling_references_are_skipped() {
        let xml = render(&analysis());
        assert!(!xml.contains("target=\"perms.ghost\""));
    }

    #[test]
    fn test_labels_are_escaped() {
        let xml = render(&analysis());
        assert!(xml.contains("Root &lt;set&gt;"));
        assert!(!xml.contains("Root <set>"));
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph/permissions.gexf");
        write(&path, &analysis()).unwrap();
        assert!(path.exists());
    }
}
