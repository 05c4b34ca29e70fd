use std::process::ExitCode;

use gramtui::cli::{Command, Flags};
use gramtui::controllers::account_controller;
use gramtui::{start_app, Config, GramtuiError, HttpClient};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let flags = Flags::from_args();
    match run(flags).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(flags: Flags) -> Result<(), GramtuiError> {
    let mut config = Config::load()?;
    if let Some(api_url) = flags.api_url.clone() {
        config.api_url = api_url;
    }
    log::debug!("Using API at {}", config.api_url);

    let client = HttpClient::new(&config.api_url, config.token.clone())?;

    match flags.command() {
        Command::Feed => start_app(client, config).await?,
        Command::Register { username, email, password } => {
            let response = account_controller::register(&client, &username, &email, &password).await?;
            println!("{}", response.message);
        }
        Command::Login { email, password } => {
            let user = account_controller::login(&client, &mut config, &email, &password).await?;
            config.save()?;
            println!("Logged in as {}", user.display_name());
        }
        Command::Logout => {
            let message = account_controller::logout(&client, &mut config).await;
            config.save()?;
            println!("{}", message);
        }
        Command::Profile { id } => {
            let user = account_controller::profile(&client, &config, id.as_deref()).await?;
            println!("{}", account_controller::describe_user(&user));
        }
        Command::Suggested => {
            let users = account_controller::suggested(&client).await?;
            if users.is_empty() {
                println!("No suggestions right now");
            }
            for user in users {
                println!("{}\n", account_controller::describe_user(&user));
            }
        }
        Command::Follow { id } => {
            let response = account_controller::follow_or_unfollow(&client, &config, &id).await?;
            println!("{}", response.message);
        }
        Command::EditProfile { bio, gender, picture } => {
            let user = account_controller::edit_profile(&client, &config, bio, gender, picture.as_deref()).await?;
            println!("Profile updated\n{}", account_controller::describe_user(&user));
        }
    }

    Ok(())
}
