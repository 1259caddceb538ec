use std::error::Error;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Currency, Engine, FundDepositCmd, FundTag, FundWithdrawCmd, MoneyCents, Period,
    RecordEntryCmd, Report, ReportScope, TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "cassa_admin")]
#[command(about = "Admin utilities for Cassa (rates, entries, funds, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`; falls back
    /// to `sqlite.path` in settings.toml, then `./cassa.db`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Rate(Rate),
    Record(RecordArgs),
    List(ListArgs),
    Fund(Fund),
    Report(ReportCmd),
    Clear(ClearArgs),
    Group(Group),
    User(User),
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    group: i64,
    #[arg(long)]
    user: Option<i64>,
    #[arg(long)]
    currency: Option<String>,
    /// Restrict to one month (YYYY-MM).
    #[arg(long)]
    month: Option<Period>,
}

#[derive(Args, Debug)]
struct Rate {
    #[command(subcommand)]
    command: RateCommand,
}

#[derive(Subcommand, Debug)]
enum RateCommand {
    /// Set the rate for a currency, effective from a date (default today).
    Set(RateSetArgs),
    /// Resolve the rate in effect for a currency on a date (default today).
    Get(RateGetArgs),
    /// List the most recently effective rates.
    List(RateListArgs),
}

#[derive(Args, Debug)]
struct RateSetArgs {
    #[arg(long)]
    currency: String,
    #[arg(long)]
    rate: Decimal,
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Operator setting the rate.
    #[arg(long)]
    by: i64,
}

#[derive(Args, Debug)]
struct RateGetArgs {
    #[arg(long)]
    currency: String,
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct RateListArgs {
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[arg(long)]
    group: i64,
    #[arg(long)]
    user: i64,
    #[arg(long)]
    currency: String,
    /// Signed amount, e.g. "1000" or "-250.50"; the sign is normalized from
    /// the kind.
    #[arg(long, allow_hyphen_values = true)]
    amount: String,
    /// income | expense | fund_deposit | fund_withdrawal
    #[arg(long, default_value = "income")]
    kind: String,
    /// shared | private (fund kinds only)
    #[arg(long, default_value = "none")]
    fund: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    note: Option<String>,
    /// Operator recording the entry on the user's behalf.
    #[arg(long)]
    by: Option<i64>,
}

#[derive(Args, Debug)]
struct Fund {
    #[command(subcommand)]
    command: FundCommand,
}

#[derive(Subcommand, Debug)]
enum FundCommand {
    /// Deposit into a fund pool.
    Deposit(FundOpArgs),
    /// Withdraw from a fund pool (pools may go negative).
    Withdraw(FundOpArgs),
    /// Show all fund balances of a group.
    Balance(FundBalanceArgs),
}

#[derive(Args, Debug)]
struct FundOpArgs {
    #[arg(long)]
    group: i64,
    #[arg(long)]
    user: i64,
    #[arg(long)]
    currency: String,
    /// Positive amount, e.g. "6.90".
    #[arg(long)]
    amount: String,
    /// shared | private
    #[arg(long)]
    fund: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct FundBalanceArgs {
    #[arg(long)]
    group: i64,
}

#[derive(Args, Debug)]
struct ReportCmd {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// One user's entries in one group.
    Personal(PersonalReportArgs),
    /// One group, all users.
    Group(GroupReportArgs),
    /// Every group in the requesting group's fleet.
    Fleet(FleetReportArgs),
}

#[derive(Args, Debug)]
struct PersonalReportArgs {
    #[arg(long)]
    user: i64,
    #[arg(long)]
    group: i64,
    /// Past month as YYYY-MM; omit for the current month.
    #[arg(long)]
    month: Option<Period>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GroupReportArgs {
    #[arg(long)]
    group: i64,
    /// Past month as YYYY-MM; omit for the current month.
    #[arg(long)]
    month: Option<Period>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct FleetReportArgs {
    #[arg(long)]
    group: i64,
    /// Past month as YYYY-MM; omit for the current month.
    #[arg(long)]
    month: Option<Period>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ClearArgs {
    #[arg(long)]
    group: i64,
    /// Period to wipe, as YYYY-MM.
    #[arg(long)]
    month: Period,
    /// Admin performing the reset.
    #[arg(long)]
    by: i64,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    /// Register or rename a group.
    Register(GroupRegisterArgs),
    /// Fleet membership management.
    Fleet(FleetArgs),
    /// Per-group admin cache management.
    Admin(AdminArgs),
}

#[derive(Args, Debug)]
struct GroupRegisterArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct FleetArgs {
    #[command(subcommand)]
    command: FleetCommand,
}

#[derive(Subcommand, Debug)]
enum FleetCommand {
    Add(FleetMemberArgs),
    Remove(FleetMemberArgs),
    /// Show all groups aggregated with the given one.
    List(FleetListArgs),
}

#[derive(Args, Debug)]
struct FleetMemberArgs {
    #[arg(long)]
    fleet: String,
    #[arg(long)]
    group: i64,
}

#[derive(Args, Debug)]
struct FleetListArgs {
    #[arg(long)]
    group: i64,
}

#[derive(Args, Debug)]
struct AdminArgs {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Grant(AdminMemberArgs),
    Revoke(AdminMemberArgs),
}

#[derive(Args, Debug)]
struct AdminMemberArgs {
    #[arg(long)]
    group: i64,
    #[arg(long)]
    user: i64,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register or refresh a user.
    Register(UserRegisterArgs),
    /// Grant or revoke the global-admin role.
    SetRole(UserSetRoleArgs),
}

#[derive(Args, Debug)]
struct UserRegisterArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct UserSetRoleArgs {
    #[arg(long)]
    id: i64,
    /// true to grant, false to revoke.
    #[arg(long, action = clap::ArgAction::Set)]
    admin: bool,
}

fn parse_currency(raw: &str) -> Currency {
    match Currency::try_from(raw) {
        Ok(currency) => currency,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn parse_fund(raw: &str) -> FundTag {
    match FundTag::try_from(raw) {
        Ok(fund) => fund,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn parse_kind(raw: &str) -> TransactionKind {
    match TransactionKind::try_from(raw) {
        Ok(kind) => kind,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn parse_amount(raw: &str) -> i64 {
    match raw.parse::<MoneyCents>() {
        Ok(amount) => amount.cents(),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_report(report: &Report, json: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let scope = match report.scope {
        ReportScope::Personal { user_id, group_id } => {
            format!("user {user_id} in group {group_id}")
        }
        ReportScope::Group { group_id } => format!("group {group_id}"),
        ReportScope::Fleet { group_id } => format!("fleet of group {group_id}"),
    };
    println!("{} report for {scope}", report.period);

    for summary in &report.currencies {
        let net = MoneyCents::new(summary.net_minor);
        match (summary.rate, summary.usdt) {
            (Some(rate), Some(usdt)) => println!(
                "  {}{net} -> USDT {usdt} (rate {rate})",
                summary.currency.symbol()
            ),
            _ => println!("  {}{net} -> USDT unavailable", summary.currency.symbol()),
        }
    }

    if !report.funds.is_empty() {
        println!("  funds:");
        for fund in &report.funds {
            println!(
                "    {} {}{}",
                fund.fund.as_str(),
                fund.currency.symbol(),
                MoneyCents::new(fund.balance_minor)
            );
        }
    }

    for day in &report.days {
        let rates: Vec<String> = day
            .currencies
            .iter()
            .map(|c| match c.rate {
                Some(rate) => format!("{} rate {rate}", c.currency.code()),
                None => format!("{} rate unavailable", c.currency.code()),
            })
            .collect();
        println!("  {} ({})", day.date, rates.join(", "));
        for c in &day.currencies {
            match c.usdt {
                Some(usdt) => println!(
                    "    {}{} ({usdt})",
                    c.currency.symbol(),
                    MoneyCents::new(c.amount_minor)
                ),
                None => println!(
                    "    {}{}",
                    c.currency.symbol(),
                    MoneyCents::new(c.amount_minor)
                ),
            }
        }
        for line in &day.contributors {
            let amounts: Vec<String> = line
                .amounts
                .iter()
                .map(|(currency, minor)| {
                    format!("{}{}", currency.symbol(), MoneyCents::new(*minor))
                })
                .collect();
            println!("      {} {}", amounts.join("  "), line.label);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    let level = settings
        .app
        .as_ref()
        .and_then(|app| app.level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(format!("cassa_admin={level},engine={level}"))
        .init();

    let tz: Tz = settings
        .app
        .as_ref()
        .and_then(|app| app.timezone.as_deref())
        .unwrap_or("Asia/Taipei")
        .parse()
        .map_err(|_| "invalid timezone in settings")?;
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();

    let database_url = cli
        .database_url
        .or_else(|| {
            settings
                .sqlite
                .as_ref()
                .map(|s| format!("sqlite:{}?mode=rwc", s.path))
        })
        .unwrap_or_else(|| "sqlite:./cassa.db?mode=rwc".to_string());

    let db = connect_db(&database_url).await?;
    tracing::debug!("database ready");
    let ledger = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Rate(Rate { command }) => match command {
            RateCommand::Set(args) => {
                let currency = parse_currency(&args.currency);
                let date = args.date.unwrap_or(today);
                ledger.set_rate(currency, date, args.rate, args.by).await?;
                println!("rate set: {} {} from {date}", currency.code(), args.rate);
            }
            RateCommand::Get(args) => {
                let currency = parse_currency(&args.currency);
                let date = args.date.unwrap_or(today);
                let rate = ledger.resolve_rate(currency, date).await?;
                println!("{} rate on {date}: {rate}", currency.code());
            }
            RateCommand::List(args) => {
                for rate in ledger.list_rates(args.limit).await? {
                    println!(
                        "{} {} from {}",
                        rate.currency.code(),
                        rate.rate,
                        rate.effective_date
                    );
                }
            }
        },
        Command::Record(args) => {
            let currency = parse_currency(&args.currency);
            let kind = parse_kind(&args.kind);
            let fund = parse_fund(&args.fund);
            let amount_minor = parse_amount(&args.amount);

            let mut cmd =
                RecordEntryCmd::new(args.group, args.user, currency, amount_minor, kind, today)
                    .fund(fund);
            if let Some(date) = args.date {
                cmd = cmd.date(date);
            }
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            if let Some(by) = args.by {
                cmd = cmd.created_by(by);
            }

            let id = ledger.record(cmd).await?;
            println!("recorded entry: {id}");
        }
        Command::List(args) => {
            let mut filter = TransactionListFilter {
                user_id: args.user,
                currency: args.currency.as_deref().map(parse_currency),
                ..Default::default()
            };
            if let Some(month) = args.month {
                filter = filter.period(month);
            }

            for entry in ledger.list_transactions(args.group, &filter).await? {
                let note = entry.note.as_deref().unwrap_or("");
                println!(
                    "{} {:15} {}{:>12} user {} {note}",
                    entry.date,
                    entry.kind.as_str(),
                    entry.currency.symbol(),
                    MoneyCents::new(entry.amount_minor).to_string(),
                    entry.user_id,
                );
            }
        }
        Command::Fund(Fund { command }) => match command {
            FundCommand::Deposit(args) => {
                let currency = parse_currency(&args.currency);
                let fund = parse_fund(&args.fund);
                let amount_minor = parse_amount(&args.amount);

                let mut cmd = FundDepositCmd::new(
                    args.group,
                    args.user,
                    currency,
                    amount_minor,
                    fund,
                    today,
                );
                if let Some(date) = args.date {
                    cmd = cmd.date(date);
                }
                if let Some(note) = args.note {
                    cmd = cmd.note(note);
                }

                let id = ledger.fund_deposit(cmd).await?;
                println!("recorded fund deposit: {id}");
            }
            FundCommand::Withdraw(args) => {
                let currency = parse_currency(&args.currency);
                let fund = parse_fund(&args.fund);
                let amount_minor = parse_amount(&args.amount);

                let mut cmd = FundWithdrawCmd::new(
                    args.group,
                    args.user,
                    currency,
                    amount_minor,
                    fund,
                    today,
                );
                if let Some(date) = args.date {
                    cmd = cmd.date(date);
                }
                if let Some(note) = args.note {
                    cmd = cmd.note(note);
                }

                let id = ledger.fund_withdraw(cmd).await?;
                println!("recorded fund withdrawal: {id}");
            }
            FundCommand::Balance(args) => {
                let balances = ledger.fund_balances(args.group).await?;
                if balances.is_empty() {
                    println!("no fund entries for group {}", args.group);
                }
                for balance in balances {
                    println!(
                        "{} {}{}",
                        balance.fund.as_str(),
                        balance.currency.symbol(),
                        MoneyCents::new(balance.balance_minor)
                    );
                }
            }
        },
        Command::Report(ReportCmd { command }) => {
            let current = Period::containing(today);
            let (scope, month, json) = match command {
                ReportCommand::Personal(args) => (
                    ReportScope::Personal {
                        user_id: args.user,
                        group_id: args.group,
                    },
                    args.month,
                    args.json,
                ),
                ReportCommand::Group(args) => (
                    ReportScope::Group {
                        group_id: args.group,
                    },
                    args.month,
                    args.json,
                ),
                ReportCommand::Fleet(args) => (
                    ReportScope::Fleet {
                        group_id: args.group,
                    },
                    args.month,
                    args.json,
                ),
            };

            let report = match month {
                Some(period) if period != current => {
                    ledger.historical_report(scope, period, today).await?
                }
                _ => match scope {
                    ReportScope::Personal { user_id, group_id } => {
                        ledger
                            .personal_report(user_id, group_id, current, today)
                            .await?
                    }
                    ReportScope::Group { group_id } => {
                        ledger.group_report(group_id, current, today).await?
                    }
                    ReportScope::Fleet { group_id } => {
                        ledger.fleet_report(group_id, current, today).await?
                    }
                },
            };
            print_report(&report, json)?;
        }
        Command::Clear(args) => {
            let removed = ledger
                .clear_group_period(args.group, args.month, args.by)
                .await?;
            println!(
                "removed {removed} entries from group {} in {}",
                args.group, args.month
            );
        }
        Command::Group(Group { command }) => match command {
            GroupCommand::Register(args) => {
                ledger.upsert_group(args.id, &args.name).await?;
                println!("registered group {} ({})", args.id, args.name);
            }
            GroupCommand::Fleet(FleetArgs { command }) => match command {
                FleetCommand::Add(args) => {
                    ledger.add_group_to_fleet(&args.fleet, args.group).await?;
                    println!("group {} added to fleet {}", args.group, args.fleet);
                }
                FleetCommand::Remove(args) => {
                    if ledger
                        .remove_group_from_fleet(&args.fleet, args.group)
                        .await?
                    {
                        println!("group {} removed from fleet {}", args.group, args.fleet);
                    } else {
                        println!("group {} was not in fleet {}", args.group, args.fleet);
                    }
                }
                FleetCommand::List(args) => {
                    for group_id in ledger.groups_in_fleet(args.group).await? {
                        println!("{group_id}");
                    }
                }
            },
            GroupCommand::Admin(AdminArgs { command }) => match command {
                AdminCommand::Grant(args) => {
                    ledger.grant_group_admin(args.group, args.user).await?;
                    println!("user {} is now admin of group {}", args.user, args.group);
                }
                AdminCommand::Revoke(args) => {
                    if ledger.revoke_group_admin(args.group, args.user).await? {
                        println!("user {} revoked from group {}", args.user, args.group);
                    } else {
                        println!("user {} was not admin of group {}", args.user, args.group);
                    }
                }
            },
        },
        Command::User(User { command }) => match command {
            UserCommand::Register(args) => {
                ledger
                    .upsert_user(args.id, args.username.as_deref(), args.name.as_deref())
                    .await?;
                println!("registered user {}", args.id);
            }
            UserCommand::SetRole(args) => {
                ledger.set_global_admin(args.id, args.admin).await?;
                println!(
                    "user {} global-admin: {}",
                    args.id,
                    if args.admin { "granted" } else { "revoked" }
                );
            }
        },
    }

    Ok(())
}
