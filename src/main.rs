#[macro_use]
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate pwgate;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use pwgate::credentials::Password;
use pwgate::error::*;
use pwgate::keychain::{Keychain, SecretStore};
use pwgate::password::{password_prompt, password_prompt_with_keychain, StorePolicy};
use pwgate::prompt::PromptRequest;

use std::env;
use std::io::Write;
use std::process;

fn main() {
    env_logger::init();

    // Usage sketch:
    // > pwgate ask -p "Master Password"
    // > pwgate unlock -a me@example.com    # keychain first, offers to save
    // > pwgate store -a me@example.com     # seed the keychain explicitly
    // > pwgate rm -a me@example.com
    // > pwgate status -a me@example.com
    // > pwgate auth -r "unlock the vault"
    let matches = App::new("pwgate")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Master-password prompting with a keychain shortcut")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(prompt_args(
            SubCommand::with_name("ask").about("Prompt for a password and print it"),
        ))
        .subcommand(keychain_args(prompt_args(
            SubCommand::with_name("unlock")
                .about("Prompt for a password, short-circuited by the keychain")
                .arg(
                    Arg::with_name("save")
                        .help("Store a newly entered password without asking")
                        .long("save"),
                )
                .arg(
                    Arg::with_name("no-save")
                        .help("Never store a newly entered password")
                        .long("no-save")
                        .conflicts_with("save"),
                ),
        )))
        .subcommand(keychain_args(prompt_args(
            SubCommand::with_name("store").about("Prompt for a password and store it"),
        )))
        .subcommand(keychain_args(
            SubCommand::with_name("rm").about("Remove a stored password"),
        ))
        .subcommand(keychain_args(
            SubCommand::with_name("status").about("Report keychain support and stored records"),
        ))
        .subcommand(
            SubCommand::with_name("auth")
                .about("Run a stand-alone biometric check")
                .arg(
                    Arg::with_name("reason")
                        .help("Reason shown in the authentication dialog")
                        .takes_value(true)
                        .short("r")
                        .long("reason")
                        .default_value("authenticate"),
                ),
        )
        .get_matches();

    if let Err(ref e) = run(matches) {
        let stderr = &mut std::io::stderr();
        let errmsg = "Error writing to stderr";

        writeln!(stderr, "error: {}", e).expect(errmsg);

        for cause in e.iter_chain().skip(1) {
            writeln!(stderr, "caused by: {}", cause).expect(errmsg);
        }

        process::exit(1);
    }
}

fn prompt_args<'a, 'b>(command: App<'a, 'b>) -> App<'a, 'b> {
    command.args_from_usage(
        "-t, --title [TITLE] 'Dialog title'
         -p, --prompt [PROMPT] 'Prompt label'
         -d, --desc [DESC] 'Description shown above the prompt'
         -e, --error [ERROR] 'Error text from a previous attempt'",
    )
}

fn keychain_args<'a, 'b>(command: App<'a, 'b>) -> App<'a, 'b> {
    command
        .arg(
            Arg::with_name("service")
                .help("Keychain service name")
                .takes_value(true)
                .short("s")
                .long("service")
                .default_value("pwgate"),
        )
        .arg(
            Arg::with_name("account")
                .help("Account the secret belongs to (or PWGATE_ACCOUNT)")
                .takes_value(true)
                .short("a")
                .long("account"),
        )
}

fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("ask", Some(matches)) => ask(matches),
        ("unlock", Some(matches)) => unlock(matches),
        ("store", Some(matches)) => store(matches),
        ("rm", Some(matches)) => rm(matches),
        ("status", Some(matches)) => status(matches),
        ("auth", Some(matches)) => auth(matches),
        _ => unreachable!(),
    }
}

fn request_from<'a>(matches: &'a ArgMatches) -> PromptRequest<'a> {
    let mut request = PromptRequest::new(
        matches.value_of("title").unwrap_or("pwgate"),
        matches.value_of("prompt").unwrap_or("Master Password"),
    );
    if let Some(description) = matches.value_of("desc") {
        request = request.description(description);
    }
    if let Some(error) = matches.value_of("error") {
        request = request.error(error);
    }
    request
}

fn account_from(matches: &ArgMatches) -> Option<String> {
    match matches.value_of("account") {
        Some(account) => Some(String::from(account)),
        None => env::var("PWGATE_ACCOUNT").ok(),
    }
}

fn require_account(matches: &ArgMatches) -> Result<String> {
    match account_from(matches) {
        Some(account) => Ok(account),
        None => bail!("no account given; pass --account or set PWGATE_ACCOUNT"),
    }
}

fn unwrap_cancelled(secret: Option<Password>) -> Password {
    match secret {
        Some(secret) => secret,
        None => {
            eprintln!("cancelled");
            process::exit(1)
        }
    }
}

fn ask(matches: &ArgMatches) -> Result<()> {
    let request = request_from(matches);
    let secret = unwrap_cancelled(password_prompt(&request)?);
    println!("{}", secret.str());
    Ok(())
}

fn unlock(matches: &ArgMatches) -> Result<()> {
    let request = request_from(matches);
    let service = matches.value_of("service").unwrap();
    let account = require_account(matches)?;
    let policy = if matches.is_present("save") {
        StorePolicy::Always
    } else if matches.is_present("no-save") {
        StorePolicy::Never
    } else {
        StorePolicy::Ask
    };
    let secret = unwrap_cancelled(password_prompt_with_keychain(
        &request, service, &account, policy,
    )?);
    println!("{}", secret.str());
    Ok(())
}

fn store(matches: &ArgMatches) -> Result<()> {
    let service = matches.value_of("service").unwrap();
    let account = require_account(matches)?;
    let keychain = Keychain::new()?;
    let secret = unwrap_cancelled(password_prompt(&request_from(matches))?);
    keychain.store(service, &account, &secret)
}

fn rm(matches: &ArgMatches) -> Result<()> {
    let service = matches.value_of("service").unwrap();
    let account = require_account(matches)?;
    Keychain::new()?.delete(service, &account)
}

fn status(matches: &ArgMatches) -> Result<()> {
    println!("platform support: {}", Keychain::supported());
    println!("usable now: {}", Keychain::available());
    if let Some(account) = account_from(matches) {
        if Keychain::available() {
            let service = matches.value_of("service").unwrap();
            let keychain = Keychain::new()?;
            println!(
                "stored for {}/{}: {}",
                service,
                account,
                keychain.exists(service, &account)?
            );
        }
    }
    Ok(())
}

fn auth(matches: &ArgMatches) -> Result<()> {
    Keychain::new()?.authenticate(matches.value_of("reason").unwrap())
}
