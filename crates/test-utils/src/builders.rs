#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use buildo::config::{BuildSection, ConfigFile, RawConfigFile, ToolchainSection, VariantConfig};
use buildo::dag::{Graph, VertexKind};

/// Builder for `Graph` to simplify test setup.
///
/// Vertices are added in call order; each `deps` list becomes edges from the
/// new vertex, in order, so every dependency must be declared first.
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    pub fn vertex(mut self, id: &str, kind: VertexKind, deps: &[&str]) -> Self {
        self.graph
            .add_vertex(id, kind)
            .expect("Failed to add vertex in builder");
        self.graph
            .add_edges(id, deps.iter().copied())
            .expect("Failed to add edges in builder");
        self
    }

    pub fn source(self, id: &str) -> Self {
        self.vertex(id, VertexKind::Source, &[])
    }

    pub fn header(self, id: &str) -> Self {
        self.vertex(id, VertexKind::Header, &[])
    }

    pub fn dir(self, id: &str, deps: &[&str]) -> Self {
        self.vertex(id, VertexKind::Directory, deps)
    }

    pub fn config(self, key: &str) -> Self {
        self.vertex(
            &format!("config:{key}"),
            VertexKind::ConfigEntry {
                key: key.to_string(),
            },
            &[],
        )
    }

    pub fn object(self, id: &str, deps: &[&str]) -> Self {
        self.vertex(
            id,
            VertexKind::Object {
                variant: "default".to_string(),
            },
            deps,
        )
    }

    pub fn main_output(self, id: &str, deps: &[&str]) -> Self {
        self.vertex(
            id,
            VertexKind::MainOutput {
                variant: "default".to_string(),
            },
            deps,
        )
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The single-source project used throughout the tests:
///
/// ```text
/// out/collect <- out/a.o <- { out, a.c, inc/a.h, config:cc }
/// ```
pub fn single_source_graph() -> Graph {
    GraphBuilder::new()
        .dir("out", &[])
        .config("cc")
        .header("inc/a.h")
        .source("a.c")
        .object("out/a.o", &["out", "a.c", "inc/a.h", "config:cc"])
        .main_output("out/collect", &["config:cc", "out/a.o"])
        .build()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                toolchain: ToolchainSection::default(),
                build: BuildSection::default(),
                variant: BTreeMap::new(),
            },
        }
    }

    pub fn cc(mut self, cc: &str) -> Self {
        self.config.toolchain.cc = Some(cc.to_string());
        self
    }

    pub fn include_dir(mut self, dir: &str) -> Self {
        self.config.toolchain.include_dirs.push(PathBuf::from(dir));
        self
    }

    pub fn out_dir(mut self, dir: &str) -> Self {
        self.config.build.out_dir = PathBuf::from(dir);
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.config.build.output = name.to_string();
        self
    }

    pub fn state_dir(mut self, dir: &str) -> Self {
        self.config.build.state_dir = PathBuf::from(dir);
        self
    }

    pub fn sources(mut self, patterns: &[&str]) -> Self {
        self.config.build.sources = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.build.exclude.push(pattern.to_string());
        self
    }

    pub fn with_variant(mut self, name: &str, cflags: &[&str]) -> Self {
        self.config.variant.insert(
            name.to_string(),
            VariantConfig {
                cflags: cflags.iter().map(|f| f.to_string()).collect(),
                ..VariantConfig::default()
            },
        );
        self
    }

    pub fn with_libs(mut self, name: &str, libs: &[&str]) -> Self {
        let variant = self.config.variant.entry(name.to_string()).or_default();
        variant.libs.extend(libs.iter().map(|l| l.to_string()));
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
