use meeting_assistant::components::google_calendar::{OAuthFlow, TokenFile};
use meeting_assistant::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging(false)?;

    // Load configuration
    let config = startup::load_config()?;

    let client = startup::http_client()?;
    let oauth = startup::oauth_flow(&config, client);
    let token_file = TokenFile::new(config.token_file.clone());

    // Always run consent, even if a usable token is already stored
    let credential = oauth.consent().await?;
    token_file.save(&credential).await?;

    println!(
        "Token successfully saved to {}!",
        token_file.path().display()
    );

    Ok(())
}
