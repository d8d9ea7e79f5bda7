//! Thin demonstration binary: wires a `Tree`, an XML-backed persistence
//! file, and an RCP server together. Mirrors `graphix-shell`'s role as the
//! workspace's clap-driven binary, minus everything graphix-shell does that
//! is specific to its own REPL/module-resolution surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cfgtree_core::Tree;
use cfgtree_rcp::RcpServer;
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(version, about)]
struct Params {
    /// address the RCP server listens on
    #[arg(long, default_value = "127.0.0.1:4040")]
    listen: SocketAddr,
    /// XML file the tree is loaded from at startup and saved to on exit;
    /// if it does not exist yet, the tree starts empty
    #[arg(long)]
    persistence: Option<PathBuf>,
    /// per-connection push-queue capacity before a subscriber is disconnected
    #[arg(long, default_value_t = 64)]
    push_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let p = Params::parse();

    let tree = Arc::new(Tree::new());
    if let Some(path) = &p.persistence {
        if path.exists() {
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("reading persistence file {}", path.display()))?;
            let report = cfgtree_xml::import(&tree, &xml, false)
                .with_context(|| format!("importing persistence file {}", path.display()))?;
            info!("loaded {} attributes from {}", report.applied, path.display());
            for diag in &report.skipped {
                log::warn!("skipped during import: {diag}");
            }
        }
    }

    let server = RcpServer::new(tree.clone(), p.push_capacity);
    info!("listening on {}", p.listen);
    let serve = tokio::spawn(server.bind_and_serve(p.listen));

    tokio::select! {
        result = serve => {
            result.context("RCP server task panicked")?.context("RCP server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    if let Some(path) = &p.persistence {
        let xml = cfgtree_xml::export(&tree.root()).context("exporting tree")?;
        std::fs::write(path, xml).with_context(|| format!("writing persistence file {}", path.display()))?;
        info!("saved tree to {}", path.display());
    }

    Ok(())
}
