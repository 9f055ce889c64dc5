use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // MO_JWT_SECRET and MO_SUPERADMIN_PASSWORD are deliberately left off this list
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "MO_HOST",
        "MO_PORT",
        "MO_DATABASE_URL",
        "MO_DB_MAX_CONNECTIONS",
        "MO_JWT_LIFETIME_HOURS",
        "MO_USE_X_FORWARDED_FOR",
        "MO_USE_FORWARDED",
        "MO_EVENT_BUFFER_SIZE",
        "MO_SUPERADMIN_EMAIL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
