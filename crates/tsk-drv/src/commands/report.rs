//! Read-side commands: list, information, count, export, tags,
//! projects and the shell-completion helpers.
//!
//! Rendering is deliberately plain; report configuration, color and
//! column layout belong to external collaborators.

use std::collections::BTreeMap;

use tsk_core::Task;
use tsk_time::CalDate;
use tsk_util::Result;

use crate::engine::Engine;

/// The `limit:` pseudo attribute, when given.
fn limit(engine: &Engine) -> Option<usize> {
    engine
        .pipeline
        .pseudo_args()
        .iter()
        .find(|a| a.attrs.name.as_deref() == Some("limit"))
        .and_then(|a| a.attrs.value.as_deref())
        .and_then(|v| v.parse().ok())
}

fn matched(engine: &mut Engine, force_completed: bool) -> Result<Vec<Task>> {
    let filter = engine.compile_filter()?;
    engine.selected_all(&filter, force_completed)
}

/// The user filter wrapped in a leading `status == 'pending'` clause,
/// the shape the completed-store shortcut recognizes.
fn pending_report_filter(engine: &Engine) -> Result<crate::filter::Filter> {
    use tsk_lex::{Token, TokenKind};

    let mut tokens = vec![
        Token::new("status", TokenKind::Identifier),
        Token::new("==", TokenKind::Op),
        Token::new("pending", TokenKind::String),
    ];
    let user = engine.pipeline.filter_tokens();
    if !user.is_empty() {
        tokens.push(Token::new("and", TokenKind::Op));
        tokens.push(Token::new("(", TokenKind::Op));
        tokens.extend(user);
        tokens.push(Token::new(")", TokenKind::Op));
    }
    crate::filter::Filter::compile(&engine.eval, tokens)
}

/// `list`: one line per matched pending task. The report's own
/// `status == 'pending'` clause keeps the completed store unloaded.
pub fn list(engine: &mut Engine) -> Result<String> {
    let filter = pending_report_filter(engine)?;
    let mut tasks = engine.selected_all(&filter, false)?;
    tasks.sort_by_key(|t| t.id.unwrap_or(usize::MAX));
    if let Some(limit) = limit(engine) {
        tasks.truncate(limit);
    }

    if tasks.is_empty() {
        return Ok("No matches.".to_string());
    }

    let dateformat = engine.config.get("dateformat").unwrap_or("m/d/Y").to_string();
    let weekstart = engine.config.weekstart();

    let mut out = String::new();
    out.push_str(&format!(
        "{:>4} {:<14} {:<12} {}\n",
        "ID", "Project", "Due", "Description"
    ));
    for task in &tasks {
        let id = task
            .id
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        let due = task
            .get_date("due")
            .map(|epoch| {
                tsk_time::format::format(&CalDate::from_epoch(epoch), &dateformat, weekstart)
            })
            .unwrap_or_default();
        out.push_str(&format!(
            "{:>4} {:<14} {:<12} {}\n",
            id,
            task.get("project").unwrap_or(""),
            due,
            task.description()
        ));
    }
    out.push_str(&format!(
        "\n{} task{}",
        tasks.len(),
        if tasks.len() == 1 { "" } else { "s" }
    ));
    Ok(out)
}

/// `information`: every attribute of each matched task.
pub fn information(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    if tasks.is_empty() {
        return Ok("No matches.".to_string());
    }

    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{:<14} {}\n",
            "ID",
            task.id
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
        let json = task.to_json();
        if let Some(object) = json.as_object() {
            let sorted: BTreeMap<_, _> = object.iter().collect();
            for (name, value) in sorted {
                let rendered = match value.as_str() {
                    Some(text) => text.to_string(),
                    None => value.to_string(),
                };
                out.push_str(&format!("{:<14} {}\n", name, rendered));
            }
        }
    }
    Ok(out.trim_end().to_string())
}

/// `count`: the number of matched tasks.
pub fn count(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    Ok(tasks.len().to_string())
}

/// `export`: matched tasks as a JSON array. Exports consult both
/// stores.
pub fn export(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, true)?;
    let array: Vec<serde_json::Value> = tasks.iter().map(|t| t.to_json()).collect();
    serde_json::to_string_pretty(&array)
        .map_err(|e| tsk_util::Error::Unknown(format!("export failed: {}", e)))
}

/// `tags`: tag usage counts over the matched tasks.
pub fn tags(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for task in &tasks {
        for tag in task.tags() {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        return Ok("No tags.".to_string());
    }
    let mut out = String::new();
    for (tag, n) in counts {
        out.push_str(&format!("{:<20} {}\n", tag, n));
    }
    Ok(out.trim_end().to_string())
}

/// `projects`: project usage counts over the matched tasks.
pub fn projects(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for task in &tasks {
        if let Some(project) = task.get("project") {
            *counts.entry(project.to_string()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        return Ok("No projects.".to_string());
    }
    let mut out = String::new();
    for (project, n) in counts {
        out.push_str(&format!("{:<20} {}\n", project, n));
    }
    Ok(out.trim_end().to_string())
}

/// `_tags`: one tag per line, for shell completion.
pub fn helper_tags(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    let mut names: Vec<String> = Vec::new();
    for task in &tasks {
        for tag in task.tags() {
            if !names.contains(tag) {
                names.push(tag.clone());
            }
        }
    }
    names.sort();
    Ok(names.join("\n"))
}

/// `_projects`: one project per line, for shell completion.
pub fn helper_projects(engine: &mut Engine) -> Result<String> {
    let tasks = matched(engine, false)?;
    let mut names: Vec<String> = Vec::new();
    for task in &tasks {
        if let Some(project) = task.get("project") {
            if !names.iter().any(|n| n == project) {
                names.push(project.to_string());
            }
        }
    }
    names.sort();
    Ok(names.join("\n"))
}
