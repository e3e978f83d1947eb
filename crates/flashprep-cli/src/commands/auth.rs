use anyhow::Result;
use colored::Colorize;

use super::{Context, output};

pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let provider = ctx.gotrue()?;
    let session = provider.sign_in_with_password(email, password).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&session.user)?);
    } else {
        output::user(&session.user);
        println!("\n💡 {}", "Use this token for later commands:".bright_yellow());
    }
    println!("export FLASHPREP_TOKEN={}", session.access_token);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let mut running = ctx.start().await?;
    running.require_token("/logout")?;
    running.app.session().logout().await;
    running.flush();
    println!("{}", "Signed out.".green());
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let running = ctx.start().await?;
    running.require_token("/profile")?;
    if let Some(user) = running.app.session().user() {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&user)?);
        } else {
            output::user(&user);
        }
    }
    Ok(())
}
