use jotter_core::NoteQuery;

use crate::commands::common::{resolve_password, Client};
use crate::error::CliError;

pub async fn run_login(
    client: &Client,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    client.sign_in(email, &password).await?;
    prime_cache(client).await?;
    println!("Signed in as {}", email.trim());
    Ok(())
}

pub async fn run_register(
    client: &Client,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    client.register(email, &password).await?;
    prime_cache(client).await?;
    println!("Registered and signed in as {}", email.trim());
    Ok(())
}

pub async fn run_logout(client: &Client) -> Result<(), CliError> {
    let pending = client.store().queue().len().await;
    client.logout().await;
    if pending > 0 {
        println!("Signed out; discarded {pending} pending changes");
    } else {
        println!("Signed out");
    }
    Ok(())
}

/// Fetch the first page so the offline cache is populated right away
async fn prime_cache(client: &Client) -> Result<(), CliError> {
    client.load_notes(&NoteQuery::default()).await?;
    Ok(())
}
