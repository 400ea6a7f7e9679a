use diary_core::session::Route;
use diary_core::Error;

use crate::cli::AuthCommands;
use crate::commands::common::open_controller;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let (mut controller, profile_name) =
                open_controller(profile.as_deref().or(global_profile))?;
            controller
                .login(&email, &password)
                .await
                .map_err(CliError::Notified)?;
            if controller.router().last_route() == Some(Route::Home) {
                println!("Signed in profile '{profile_name}'");
            }
            Ok(())
        }
        AuthCommands::Register {
            profile,
            username,
            email,
            password,
            confirm_password,
        } => {
            let (mut controller, profile_name) =
                open_controller(profile.as_deref().or(global_profile))?;
            controller
                .register(&username, &email, &password, &confirm_password)
                .await
                .map_err(CliError::Notified)?;
            println!(
                "Account created. Run `diary auth login --profile {profile_name} --email <email> --password <password>` to sign in."
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let (controller, profile_name) =
                open_controller(profile.as_deref().or(global_profile))?;
            let session = controller.session();
            if !session.is_authenticated() {
                println!("Profile '{profile_name}' is not signed in.");
                return Ok(());
            }

            match session.validate(controller.store().backend()).await {
                Ok(user) => {
                    println!(
                        "Profile '{profile_name}' is signed in as {}",
                        user.display_name()
                    );
                    Ok(())
                }
                Err(Error::Api { status: 401, .. }) => {
                    println!(
                        "Profile '{profile_name}' has a stored token that the server rejected."
                    );
                    Ok(())
                }
                Err(error) => Err(error.into()),
            }
        }
        AuthCommands::Logout { profile } => {
            let (mut controller, profile_name) =
                open_controller(profile.as_deref().or(global_profile))?;
            controller.logout();
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
