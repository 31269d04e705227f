//! Static description of the pipeline, served at `GET /graph`.

use serde::Serialize;

/// Role of a node in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    InboundAdapter,
    Channel,
    Transformer,
    Handler,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub name: String,
    pub kind: NodeKind,
    /// Human-readable detail, e.g. the polled directory or HTTP route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub from: String,
    pub to: String,
    /// `true` for the wire-tap branch.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tap: bool,
}

/// Inputs needed to describe the running graph.
#[derive(Debug, Clone, Default)]
pub struct GraphSources {
    pub file_dir: Option<String>,
    pub web_route: Option<String>,
    pub mail_spool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl PipelineGraph {
    /// Describe the pipeline with the enabled sources.
    pub fn describe(sources: &GraphSources) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            links: Vec::new(),
        };

        let enabled = [
            ("file-source", &sources.file_dir),
            ("web-source", &sources.web_route),
            ("mail-source", &sources.mail_spool),
        ];
        for (name, detail) in enabled {
            if let Some(detail) = detail {
                graph.node(name, NodeKind::InboundAdapter, Some(detail.clone()));
                graph.link(name, "sourcing-channel", false);
            }
        }

        graph.node("sourcing-channel", NodeKind::Channel, None);
        graph.node("normalizer", NodeKind::Transformer, None);
        graph.node("process-channel", NodeKind::Channel, None);
        graph.node("message-logger", NodeKind::Handler, None);
        graph.node("wiretap-channel", NodeKind::Channel, None);
        graph.node("wiretap-logger", NodeKind::Handler, None);

        graph.link("sourcing-channel", "normalizer", false);
        graph.link("normalizer", "process-channel", false);
        graph.link("process-channel", "message-logger", false);
        graph.link("process-channel", "wiretap-channel", true);
        graph.link("wiretap-channel", "wiretap-logger", false);

        graph
    }

    fn node(&mut self, name: &str, kind: NodeKind, detail: Option<String>) {
        self.nodes.push(GraphNode {
            name: name.to_string(),
            kind,
            detail,
        });
    }

    fn link(&mut self, from: &str, to: &str, tap: bool) {
        self.links.push(GraphLink {
            from: from.to_string(),
            to: to.to_string(),
            tap,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sources() -> GraphSources {
        GraphSources {
            file_dir: Some("source".into()),
            web_route: Some("POST /test".into()),
            mail_spool: Some("/var/spool/relay".into()),
        }
    }

    #[test]
    fn links_reference_existing_nodes() {
        let graph = PipelineGraph::describe(&all_sources());
        for link in &graph.links {
            assert!(graph.nodes.iter().any(|n| n.name == link.from), "{}", link.from);
            assert!(graph.nodes.iter().any(|n| n.name == link.to), "{}", link.to);
        }
    }

    #[test]
    fn disabled_mail_source_is_omitted() {
        let sources = GraphSources {
            mail_spool: None,
            ..all_sources()
        };
        let graph = PipelineGraph::describe(&sources);
        assert!(!graph.nodes.iter().any(|n| n.name == "mail-source"));
        assert!(graph.nodes.iter().any(|n| n.name == "file-source"));
    }

    #[test]
    fn exactly_one_tap_link() {
        let graph = PipelineGraph::describe(&all_sources());
        let taps: Vec<_> = graph.links.iter().filter(|l| l.tap).collect();
        assert_eq!(taps.len(), 1);
        assert_eq!(taps[0].to, "wiretap-channel");
    }

    #[test]
    fn serializes_kinds_snake_case() {
        let json = serde_json::to_value(PipelineGraph::describe(&GraphSources::default())).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "channel");
        assert!(json["nodes"][0].get("detail").is_none());
    }
}
