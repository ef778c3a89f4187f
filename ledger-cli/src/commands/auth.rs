//! Login, register and logout commands

use std::env;

use anyhow::Result;
use dialoguer::{Input, Password};

use super::get_context;
use crate::output::{info, success};

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(e) => Ok(e),
        None => Ok(Input::new().with_prompt("Email").interact_text()?),
    }
}

/// Password from `LEDGER_LENS_PASSWORD`, else prompted
fn prompt_password(confirm: bool) -> Result<String> {
    if let Ok(p) = env::var("LEDGER_LENS_PASSWORD") {
        return Ok(p);
    }

    let p1 = Password::new().with_prompt("Password").interact()?;
    if confirm {
        let p2 = Password::new().with_prompt("Confirm password").interact()?;
        if p1 != p2 {
            anyhow::bail!("Passwords do not match");
        }
    }
    Ok(p1)
}

pub async fn login(email: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let email = prompt_email(email)?;
    let password = prompt_password(false)?;

    ctx.session_service.login(&email, &password).await?;
    success(&format!("Logged in to {}", ctx.session_service.api_base_url()));
    Ok(())
}

pub async fn register(email: Option<String>, name: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let email = prompt_email(email)?;
    let name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Display name (optional)")
            .allow_empty(true)
            .interact_text()?,
    };
    let password = prompt_password(true)?;

    let response = ctx
        .session_service
        .register(&email, &password, Some(name.as_str()))
        .await?;

    if response.message.is_empty() {
        success("Account created");
    } else {
        success(&response.message);
    }
    info("Run 'lens login' to sign in.");
    Ok(())
}

pub fn logout() -> Result<()> {
    let ctx = get_context()?;
    if !ctx.session_service.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.session_service.logout()?;
    success("Logged out");
    Ok(())
}
