use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::SessionContext;
use crate::domain::services::AuthGate;

/// Prompts until a known username and password pair is entered. The chat
/// never starts on a session that is not logged in.
pub fn start(gate: &AuthGate, session: &mut SessionContext) -> Result<()> {
    println!("{}\n", Paint::new(Config::get(ConfigKey::Title)).bold());

    let theme = ColorfulTheme::default();
    loop {
        let mut input = Input::<String>::with_theme(&theme).with_prompt("Username");
        let prefill = Config::get(ConfigKey::Username);
        if !prefill.is_empty() {
            input = input.with_initial_text(prefill);
        }
        let username = input.interact_text()?;

        let password = Password::with_theme(&theme)
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?;

        match gate.login(session, &username, &password) {
            Ok(()) => {
                Config::set(ConfigKey::Username, &username);
                return Ok(());
            }
            Err(err) => {
                eprintln!("{}\n", Paint::red(err.to_string()));
            }
        }
    }
}
