//! Node edits: add, rename, edit, remove.

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use modeller::prelude::*;
use std::path::PathBuf;

use super::{report_ignored, Context};

/// Parse `x,y,z` into a position.
pub fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got {s:?}"));
    };
    let parse = |v: &str| {
        v.parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| format!("{v:?} is not a finite number"))
    };
    Ok(Vec3::new(parse(*x)?, parse(*y)?, parse(*z)?))
}

pub fn add(ctx: &Context, title: Option<String>, body: Option<String>, at: Option<Vec3>) -> Result<()> {
    let mut graph = ctx.load()?;
    let position = at.unwrap_or_else(|| graph.spawn_position());
    let body = body.unwrap_or_default();

    let title = match title {
        Some(title) => match graph.insert_node(&title, &body, position)? {
            Outcome::Applied => title,
            Outcome::Ignored(rejection) => {
                report_ignored(&format!("Node {title:?}"), rejection);
                return Ok(());
            }
        },
        None => {
            let title = graph.add_node(position)?;
            if !body.is_empty() {
                graph.set_body(&title, &body)?;
            }
            title
        }
    };

    ctx.save(&graph)?;
    println!(
        "{} Added {} at ({:.1}, {:.1}, {:.1})",
        "✓".green(),
        title.cyan(),
        position.x,
        position.y,
        position.z
    );
    Ok(())
}

pub fn rename(ctx: &Context, old: &str, new: &str) -> Result<()> {
    let mut graph = ctx.load()?;
    match graph.rename_node(old, new)? {
        Outcome::Applied => {
            ctx.save(&graph)?;
            println!("{} Renamed {} to {}", "✓".green(), old.yellow(), new.cyan());
        }
        Outcome::Ignored(rejection) => report_ignored("Rename", rejection),
    }
    Ok(())
}

pub fn edit(ctx: &Context, title: &str, body: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let body = match (body, file) {
        (Some(body), _) => body,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        (None, None) => bail!("Give the new body with {} or {}", "--body".cyan(), "--file".cyan()),
    };

    let mut graph = ctx.load()?;
    graph.set_body(title, &body)?;
    ctx.save(&graph)?;
    println!("{} Updated {} ({} bytes)", "✓".green(), title.cyan(), body.len());
    Ok(())
}

pub fn remove(ctx: &Context, title: &str) -> Result<()> {
    let mut graph = ctx.load()?;
    let cascaded = graph.remove_node(title)?;
    ctx.save(&graph)?;
    println!(
        "{} Removed {} and {} connection(s)",
        "✓".green(),
        title.cyan(),
        cascaded.to_string().yellow()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positions() {
        assert_eq!(parse_vec3("1,-2.5, 3").unwrap(), Vec3::new(1.0, -2.5, 3.0));
    }

    #[test]
    fn rejects_malformed_positions() {
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,3,4").is_err());
        assert!(parse_vec3("a,b,c").is_err());
        assert!(parse_vec3("inf,0,0").is_err());
    }
}
