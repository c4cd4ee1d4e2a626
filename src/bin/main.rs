use admin_console::{
    endpoints,
    filter::{paginate, InvitationFilter, UserFilter, PAGE_SIZE},
    models::{InvitationStatus, NewInvitation, Role},
    storage::StorageScope,
    validate::PasswordReset,
    Config, Id, LoginOutcome, SessionService,
};
use anyhow::{Context, Error};
use std::{io::BufRead, path::PathBuf};
use structopt::StructOpt;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting application with {:#?}", args.command);

    let config = args.config()?;
    let service = SessionService::new(&config)?;
    let http = service.http();
    let paths = service.paths();

    match args.command {
        Command::Login {
            email,
            password,
            mfa_code,
        } => match service.login(&email, &password).await? {
            LoginOutcome::Authenticated(user) => {
                println!("Logged in as {} ({})", user.name(), user.role);
            },
            LoginOutcome::MfaRequired(challenge) => {
                if let Some(url) = &challenge.qr_code_url {
                    println!("Scan this QR code to enrol: {}", url);
                }
                let code = match mfa_code {
                    Some(code) => code,
                    None => prompt(&challenge.message)?,
                };
                let user =
                    service.verify_mfa(&challenge.user_id, &code).await?;
                println!("Logged in as {} ({})", user.name(), user.role);
            },
        },
        Command::Logout => {
            service.logout_and_wait().await;
            println!("Logged out");
        },
        Command::Whoami => match service.user() {
            Some(user) => {
                println!("{} <{}> {}", user.name(), user.email, user.role)
            },
            None => println!("Not logged in"),
        },
        Command::Users { filter, page } => {
            let filter = filter.into_filter();
            let mut query = filter.query();
            query.push(("page", page.to_string()));

            let listing = endpoints::list_users(http, paths, &query).await?;
            // older backends ignore the query string, so filter here too
            for user in filter.apply(&listing.users) {
                println!(
                    "{}\t{}\t{}\t{}",
                    user.id,
                    user.name(),
                    user.email,
                    user.role
                );
            }
            println!(
                "Page {} of {} ({} users)",
                listing.current_page, listing.total_pages, listing.total_users
            );
        },
        Command::DeleteUser { id } => {
            endpoints::delete_user(http, paths, &id).await?;
            println!("Deleted user {}", id);
        },
        Command::Roles => {
            for role in endpoints::list_roles(http, paths).await? {
                println!("{}\t{}", role, role.label());
            }
        },
        Command::Invite { email, role } => {
            let invitation = NewInvitation { email, role };
            endpoints::send_invitation(http, paths, &invitation).await?;
            println!("Invitation sent to {}", invitation.email);
        },
        Command::Invitations {
            email,
            role,
            status,
            page,
        } => {
            let filter = InvitationFilter {
                email: email.unwrap_or_default(),
                role,
                status: status.map(|s| s.0),
                ..InvitationFilter::default()
            };
            let invitations = endpoints::list_invitations(http, paths).await?;
            let page = paginate(filter.apply(&invitations), page, PAGE_SIZE);

            for invitation in &page.items {
                println!(
                    "{}\t{}\t{:?}",
                    invitation.email, invitation.role, invitation.status
                );
            }
            println!("Page {} of {}", page.current_page, page.total_pages);
        },
        Command::Clients => {
            for client in endpoints::list_clients(http, paths).await? {
                let id =
                    client.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
                println!(
                    "{}\t{}\t{}",
                    id, client.client_code, client.client_name
                );
            }
        },
        Command::Client { id } => {
            let client = endpoints::get_client(http, paths, &id).await?;
            println!("{}", serde_json::to_string_pretty(&client)?);
        },
        Command::ForgotPassword { email } => {
            service.request_password_reset(&email).await?;
            println!("A one-time password has been sent to {}", email);
        },
        Command::ResetPassword {
            email,
            otp,
            new_password,
        } => {
            let reset = PasswordReset {
                email,
                otp,
                confirm_password: new_password.clone(),
                new_password,
            };
            service.reset_password(&reset).await?;
            println!("Password reset, you can now log in");
        },
    }

    Ok(())
}

fn prompt(message: &str) -> Result<String, Error> {
    println!("{}", message);
    println!("One-time code:");

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Unable to read the one-time code")?;

    Ok(line.trim().to_string())
}

#[derive(Debug, StructOpt)]
struct Args {
    #[structopt(
        short = "c",
        long = "config",
        parse(from_os_str),
        help = "A JSON config file"
    )]
    config: Option<PathBuf>,
    #[structopt(long = "base-url", help = "The backend's base URL")]
    base_url: Option<Url>,
    #[structopt(
        long = "store",
        parse(from_os_str),
        help = "Where to keep the session between commands"
    )]
    store: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        // every invocation is a new process, so the session has to live on
        // disk for "login" to be any use to later commands
        if let Some(path) = &self.store {
            config.storage = StorageScope::Persistent { path: path.clone() };
        } else if config.storage == StorageScope::Session {
            config.storage = StorageScope::Persistent {
                path: default_store(),
            };
        }

        Ok(config)
    }
}

fn default_store() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".admin-console-session.json")
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "Log in, answering an MFA challenge if one is issued")]
    Login {
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(
            long = "mfa-code",
            help = "The code from your authenticator"
        )]
        mfa_code: Option<String>,
    },
    Logout,
    #[structopt(about = "Show the logged in user")]
    Whoami,
    Users {
        #[structopt(flatten)]
        filter: UserFilterArgs,
        #[structopt(long = "page", default_value = "1")]
        page: usize,
    },
    DeleteUser {
        id: Id,
    },
    Roles,
    Invite {
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "r", long = "role", default_value = "USER")]
        role: Role,
    },
    Invitations {
        #[structopt(long = "email")]
        email: Option<String>,
        #[structopt(long = "role")]
        role: Option<Role>,
        #[structopt(long = "status")]
        status: Option<StatusArg>,
        #[structopt(long = "page", default_value = "1")]
        page: usize,
    },
    Clients,
    Client {
        id: Id,
    },
    #[structopt(about = "Email a one-time password for resetting a password")]
    ForgotPassword {
        #[structopt(short = "e", long = "email")]
        email: String,
    },
    ResetPassword {
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(long = "otp")]
        otp: String,
        #[structopt(long = "new-password")]
        new_password: String,
    },
}

#[derive(Debug, StructOpt)]
struct UserFilterArgs {
    #[structopt(long = "first-name")]
    first_name: Option<String>,
    #[structopt(long = "last-name")]
    last_name: Option<String>,
    #[structopt(long = "email")]
    email: Option<String>,
    #[structopt(long = "role")]
    role: Option<Role>,
}

impl UserFilterArgs {
    fn into_filter(self) -> UserFilter {
        UserFilter {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            role: self.role,
        }
    }
}

#[derive(Debug)]
struct StatusArg(InvitationStatus);

impl std::str::FromStr for StatusArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let quoted = format!("\"{}\"", s.to_uppercase());
        serde_json::from_str(&quoted)
            .map(StatusArg)
            .with_context(|| format!("\"{}\" is not an invitation status", s))
    }
}
