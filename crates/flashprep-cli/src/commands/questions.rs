use anyhow::Result;
use flashprep_core::question::{FilterCriteria, QuestionDraft, QuestionScope};

use super::{Context, Running, output};

fn gate_path(scope: QuestionScope) -> &'static str {
    match scope {
        QuestionScope::Mine => "/dashboard",
        QuestionScope::Public => "/public",
    }
}

/// Loads `scope` and returns the running app, failing if the load failed.
async fn load(ctx: &Context, scope: QuestionScope) -> Result<Running> {
    let mut running = ctx.start().await?;
    if scope.requires_token() {
        running.require_token(gate_path(scope))?;
    }
    let result = running.app.load(scope).await;
    running.flush();
    result?;
    Ok(running)
}

pub async fn list(ctx: &Context, scope: QuestionScope, criteria: FilterCriteria) -> Result<()> {
    let running = load(ctx, scope).await?;
    let board = running.app.board(scope);
    board.set_filters(criteria).await;

    let snapshot = board.snapshot().await;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&*snapshot.filtered)?);
    } else {
        output::cards(&snapshot, &board.cards().await);
    }
    Ok(())
}

pub async fn tags(ctx: &Context, scope: QuestionScope) -> Result<()> {
    let running = load(ctx, scope).await?;
    let snapshot = running.app.board(scope).snapshot().await;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&*snapshot.available_tags)?);
    } else {
        output::tags(&snapshot.available_tags);
    }
    Ok(())
}

pub async fn add(ctx: &Context, draft: QuestionDraft) -> Result<()> {
    let mut running = ctx.start().await?;
    let token = running.require_token("/create")?;
    let result = running
        .app
        .board(QuestionScope::Mine)
        .create(draft, &token)
        .await;
    running.flush();
    if let Some(created) = result? {
        println!("{}", created.id);
    }
    Ok(())
}

pub async fn edit(ctx: &Context, id: &str, draft: QuestionDraft) -> Result<()> {
    let mut running = ctx.start().await?;
    let token = running.require_token("/edit")?;
    let result = running
        .app
        .board(QuestionScope::Mine)
        .update(id, draft, &token)
        .await;
    running.flush();
    if let Some(updated) = result? {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    let mut running = ctx.start().await?;
    let token = running.require_token("/dashboard")?;
    let result = running
        .app
        .board(QuestionScope::Mine)
        .delete(id, &token)
        .await;
    running.flush();
    result?;
    Ok(())
}

pub async fn generate_audio(ctx: &Context, id: &str) -> Result<()> {
    let mut running = ctx.start().await?;
    let token = running.require_token("/dashboard")?;
    let result = running
        .app
        .board(QuestionScope::Mine)
        .generate_audio(id, &token)
        .await;
    running.flush();
    println!("{}", result?);
    Ok(())
}
