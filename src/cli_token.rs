use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use docsite::cli_style::{
    get_styles, print_error, print_key_value, print_key_value_highlight, print_list_item,
    print_section_footer, print_section_header, print_success, print_warning,
};
use docsite::config::{FileConfig, LlmSettings};
use docsite::llm_tokens::{
    create_token, resolve_all_permissions, verify_token, HmacSha256Key, LlmTokenRuntime,
    Permissions, MAX_ENTRIES_PER_GROUP, MAX_GROUPS,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles(), version = env!("APP_VERSION"))]
/// Offline tool for LLM access tokens.
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct KeySource {
    /// Server TOML config; the key and groups come from its [llm] section.
    #[clap(long, value_parser = parse_path)]
    config: Option<PathBuf>,

    /// Base64 HMAC key, used when no config file is given.
    #[clap(long, conflicts_with = "config")]
    key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints a new random 256-bit key for the [llm] section.
    GenKey,

    /// Creates a token. Grants every configured group unless --groups or
    /// --entries is given.
    Create {
        #[command(flatten)]
        source: KeySource,

        /// Comma separated group indices, e.g. "0,2".
        #[clap(long)]
        groups: Option<String>,

        /// Comma separated entry indices, applied inside every enabled group.
        #[clap(long)]
        entries: Option<String>,

        /// Site origin, prints a ready to use curl command.
        #[clap(long)]
        url: Option<String>,

        /// Page path used in the curl command, e.g. "/internal/runbook.md".
        #[clap(long, default_value = "/index.md")]
        path: String,
    },

    /// Verifies a token and shows what it grants.
    Inspect {
        #[command(flatten)]
        source: KeySource,

        token: String,
    },
}

/// "0, 2,5" -> bits 0, 2 and 5.
fn parse_indices(s: &str, max: usize, what: &str) -> Result<u32> {
    let mut bits = 0u32;
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index: usize = part
            .parse()
            .with_context(|| format!("Invalid {} index: {:?}", what, part))?;
        if index >= max {
            bail!("{} index {} out of range (max {})", what, index, max - 1);
        }
        bits |= 1 << index;
    }
    Ok(bits)
}

fn load_runtime(source: &KeySource) -> Result<LlmTokenRuntime> {
    let settings = match (&source.config, &source.key) {
        (Some(path), _) => {
            let file_config = FileConfig::load(path)?;
            let llm = file_config
                .llm
                .with_context(|| format!("No [llm] section in {:?}", path))?;
            LlmSettings::from_file(llm)?
        }
        (None, Some(key)) => LlmSettings {
            key: key.clone(),
            expires_in_hours: None,
            groups: Vec::new(),
        },
        (None, None) => bail!("Either --config or --key is required"),
    };
    settings.build_runtime(None)
}

fn resolve_permissions(
    rt: &LlmTokenRuntime,
    groups: Option<&str>,
    entries: Option<&str>,
) -> Result<Permissions> {
    if groups.is_none() && entries.is_none() {
        if rt.groups().is_empty() {
            bail!("No groups configured: pass --groups and --entries, or use --config");
        }
        return Ok(resolve_all_permissions(rt));
    }

    let all = resolve_all_permissions(rt);
    let group_bits = match groups {
        Some(s) => parse_indices(s, MAX_GROUPS, "group")? as u8,
        None => all.group_bits,
    };
    let entry_bits = match entries {
        Some(s) => parse_indices(s, MAX_ENTRIES_PER_GROUP, "entry")?,
        None => all.entry_bits,
    };
    Ok(Permissions {
        group_bits,
        entry_bits,
    })
}

/// Prefixes reachable with the given bits.
fn granted_prefixes(rt: &LlmTokenRuntime, permissions: Permissions) -> Vec<String> {
    let mut prefixes = Vec::new();
    for (g, group) in rt.groups().iter().enumerate() {
        if permissions.group_bits & (1 << g) == 0 {
            continue;
        }
        for (e, entry) in group.iter().enumerate() {
            if permissions.entry_bits & (1 << e) != 0 {
                prefixes.push(format!("{} (group {}, entry {})", entry.prefix, g, e));
            }
        }
    }
    prefixes
}

fn print_grants(rt: &LlmTokenRuntime, permissions: Permissions) {
    print_key_value("Group bits", &format!("{:08b}", permissions.group_bits));
    print_key_value("Entry bits", &format!("{:024b}", permissions.entry_bits));
    if rt.groups().is_empty() {
        return;
    }
    let prefixes = granted_prefixes(rt, permissions);
    if prefixes.is_empty() {
        print_warning("Grants no configured prefix");
    }
    for prefix in prefixes {
        print_list_item(&prefix, 1);
    }
}

fn gen_key() {
    let key = HmacSha256Key::generate();
    print_section_header("New LLM token key");
    print_key_value_highlight("key", &key.to_base64());
    print_key_value("Usage", "[llm] key = \"...\", or export DOCSITE_LLM_KEY");
    print_section_footer();
}

async fn create(
    source: &KeySource,
    groups: Option<&str>,
    entries: Option<&str>,
    url: Option<&str>,
    path: &str,
) -> Result<()> {
    let rt = load_runtime(source)?;
    let permissions = resolve_permissions(&rt, groups, entries)?;
    let token = create_token(&rt, permissions.group_bits, permissions.entry_bits).await?;

    print_section_header("LLM token");
    print_key_value_highlight("token", &token);
    print_key_value("Expires in", &format!("{}h", rt.expires_in_hours()));
    print_grants(&rt, permissions);
    if let Some(url) = url {
        let url = url.trim_end_matches('/');
        print_key_value("curl", &format!("curl -s \"{}{}?llm={}\"", url, path, token));
    }
    print_section_footer();
    Ok(())
}

async fn inspect(source: &KeySource, token: &str) -> Result<()> {
    let rt = load_runtime(source)?;
    let Some(data) = verify_token(&rt, token).await else {
        bail!("Invalid token: malformed or signed with another key");
    };

    print_section_header("LLM token");
    print_key_value("Version", &data.version.to_string());
    let expires_at = rt.epoch() + Duration::hours(data.expiry_hours as i64);
    print_key_value("Expires at", &expires_at.to_rfc3339());
    if data.expired {
        print_warning("Expired");
    } else {
        print_success(&format!(
            "Valid for {}h more",
            data.remaining_hours(&rt, Utc::now())
        ));
    }
    print_grants(
        &rt,
        Permissions {
            group_bits: data.group_bits,
            entry_bits: data.entry_bits,
        },
    );
    print_section_footer();
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();
    let result = match &cli_args.command {
        Command::GenKey => {
            gen_key();
            Ok(())
        }
        Command::Create {
            source,
            groups,
            entries,
            url,
            path,
        } => {
            create(
                source,
                groups.as_deref(),
                entries.as_deref(),
                url.as_deref(),
                path,
            )
            .await
        }
        Command::Inspect { source, token } => inspect(source, token).await,
    };

    if let Err(err) = result {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
