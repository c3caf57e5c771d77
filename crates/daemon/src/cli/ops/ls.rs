use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;

use common::farm::{Content, FarmError, ShareFarm};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Directory holding the share files
    pub farm: PathBuf,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = FarmError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let contents = ShareFarm::open(&self.farm)?.scan()?;
        Ok(render(&contents))
    }
}

/// One line per content: stem, size, permission bits, present/total shares
/// and the share indices, absent ones marked with `!`
fn render(contents: &[Content]) -> String {
    if contents.is_empty() {
        return "No contents found".to_string();
    }

    let width = contents.iter().map(|c| c.stem.len()).max().unwrap_or(0);
    let mut out = String::new();
    for content in contents {
        let indices = content
            .shares
            .iter()
            .map(|s| {
                if s.present {
                    s.index.to_string()
                } else {
                    format!("{}!", s.index)
                }
            })
            .collect::<Vec<_>>()
            .join(",");

        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:<width$}  {:>10}  {:04o}  {}/{}  [{}]",
            content.stem,
            content.attr.size,
            content.attr.perm,
            content.present_shares().count(),
            content.share_count(),
            indices,
        );
    }
    out
}
