use super::{Settings, TomlConfig};
use crate::core::query::ExpertQuery;
use crate::domain::model::DocumentKind;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "ted-search", version)]
#[command(about = "Search TED procurement notices and export them to Excel and JSON")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML search profile; CLI flags override its values
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Log elapsed time and memory per phase
    #[arg(long, global = true)]
    pub monitor: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search notices and export them (default)
    Search(SearchArgs),
    /// Print how many notices match, without exporting anything
    Count(SearchArgs),
    /// Check that the API is reachable and show its supported version
    Health {
        /// Path of the status endpoint on the API host
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Expert query, e.g. 'FT="kassel"'
    #[arg(short, long)]
    pub query: Option<String>,

    /// Comma-separated fields to request
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Notices per page (1-250)
    #[arg(short, long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Page until the results run out
    #[arg(long, conflicts_with = "max_pages")]
    pub all_pages: bool,

    #[arg(long)]
    pub start_page: Option<u32>,

    /// Stop after this many notices
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Keep only notices with a PDF in this language (e.g. DEU)
    #[arg(long)]
    pub language: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Base file name; derived from the query when omitted
    #[arg(short, long)]
    pub name: Option<String>,

    /// Append a _YYYYmmdd_HHMMSS suffix to the file names
    #[arg(long)]
    pub timestamp: bool,

    /// Also download notice documents (xml, pdf)
    #[arg(long, value_delimiter = ',', value_enum)]
    pub download: Vec<DocumentKind>,

    /// Language of downloaded PDFs
    #[arg(long)]
    pub document_language: Option<String>,

    #[command(flatten)]
    pub criteria: CriteriaArgs,
}

/// Builds the query when `--query` is not given.
#[derive(Debug, Clone, Default, Args)]
pub struct CriteriaArgs {
    #[arg(long)]
    pub full_text: Option<String>,
    /// NUTS code of the place of performance
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub cpv: Option<String>,
    /// CPV code on lot level
    #[arg(long)]
    pub cpv_lot: Option<String>,
    #[arg(long)]
    pub notice_type: Option<String>,
    #[arg(long)]
    pub procedure_type: Option<String>,
    #[arg(long)]
    pub contract_nature: Option<String>,
    #[arg(long)]
    pub legal_basis: Option<String>,
    #[arg(long)]
    pub published_from: Option<String>,
    #[arg(long)]
    pub published_to: Option<String>,
    #[arg(long)]
    pub deadline_before: Option<String>,
    #[arg(long)]
    pub buyer: Option<String>,
    #[arg(long)]
    pub buyer_country: Option<String>,
    #[arg(long)]
    pub authority_activity: Option<String>,
    #[arg(long)]
    pub lot_number: Option<String>,
    #[arg(long)]
    pub publication_number: Option<String>,
    /// Official Journal issue, e.g. 2025/123
    #[arg(long)]
    pub gazette_issue: Option<String>,
}

impl From<&CriteriaArgs> for ExpertQuery {
    fn from(args: &CriteriaArgs) -> Self {
        ExpertQuery {
            full_text: args.full_text.clone(),
            place_of_performance: args.region.clone(),
            cpv: args.cpv.clone(),
            cpv_lot: args.cpv_lot.clone(),
            notice_type: args.notice_type.clone(),
            procedure_type: args.procedure_type.clone(),
            contract_nature: args.contract_nature.clone(),
            legal_basis: args.legal_basis.clone(),
            published_from: args.published_from.clone(),
            published_to: args.published_to.clone(),
            deadline_before: args.deadline_before.clone(),
            buyer_name: args.buyer.clone(),
            buyer_country: args.buyer_country.clone(),
            authority_activity: args.authority_activity.clone(),
            lot_number: args.lot_number.clone(),
            publication_number: args.publication_number.clone(),
            gazette_issue: args.gazette_issue.clone(),
        }
    }
}

impl CliConfig {
    /// Search arguments; running without a subcommand searches with defaults.
    pub fn search_args(&self) -> SearchArgs {
        match &self.command {
            Some(Command::Search(args)) | Some(Command::Count(args)) => args.clone(),
            _ => SearchArgs::default(),
        }
    }

    /// Defaults, then the TOML profile, then explicit flags.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.into_settings(),
            None => Settings::default(),
        };
        self.apply_to(&mut settings);
        Ok(settings)
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(base_url) = &self.base_url {
            settings.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.api.timeout_seconds = timeout;
        }
        if let Some(Command::Health {
            path: Some(path), ..
        }) = &self.command
        {
            settings.api.health_path = path.clone();
        }

        let args = self.search_args();
        if let Some(query) = args
            .query
            .clone()
            .or_else(|| ExpertQuery::from(&args.criteria).build())
        {
            settings.search.query = query;
        }
        if !args.fields.is_empty() {
            settings.search.fields = args.fields.clone();
        }
        if let Some(limit) = args.limit {
            settings.search.limit = limit;
        }
        if let Some(max_pages) = args.max_pages {
            settings.search.max_pages = Some(max_pages);
        }
        if args.all_pages {
            settings.search.max_pages = None;
        }
        if let Some(start_page) = args.start_page {
            settings.search.start_page = start_page;
        }
        if let Some(max_results) = args.max_results {
            settings.search.max_results = Some(max_results);
        }
        if let Some(language) = &args.language {
            settings.search.language = Some(language.clone());
        }
        if let Some(output) = &args.output {
            settings.export.output_path = output.clone();
        }
        if let Some(name) = &args.name {
            settings.export.name = Some(name.clone());
        }
        if args.timestamp {
            settings.export.timestamp = true;
        }
        if !args.download.is_empty() {
            settings.documents.kinds = args.download.clone();
        }
        if let Some(language) = &args.document_language {
            settings.documents.language = language.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_no_arguments_runs_example_search() {
        let cli = parse(&["ted-search"]);
        let settings = cli.settings().unwrap();

        assert!(cli.command.is_none());
        assert_eq!(settings, Settings::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_search_flags_override_defaults() {
        let cli = parse(&[
            "ted-search",
            "search",
            "--query",
            "FT=\"kassel\"",
            "--fields",
            "publicationNumber,noticeTitle",
            "--limit",
            "50",
            "--max-pages",
            "3",
            "--output",
            "/tmp/out",
            "--download",
            "xml,pdf",
            "--verbose",
        ]);
        let settings = cli.settings().unwrap();

        assert!(cli.verbose);
        assert_eq!(settings.search.fields, vec!["publicationNumber", "noticeTitle"]);
        assert_eq!(settings.search.limit, 50);
        assert_eq!(settings.search.max_pages, Some(3));
        assert_eq!(settings.export.output_path, "/tmp/out");
        assert_eq!(
            settings.documents.kinds,
            vec![DocumentKind::Xml, DocumentKind::Pdf]
        );
    }

    #[test]
    fn test_criteria_flags_build_query() {
        let cli = parse(&[
            "ted-search",
            "search",
            "--cpv",
            "45000000",
            "--buyer-country",
            "DEU",
            "--all-pages",
        ]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.search.query, "PC=\"45000000\" AND CY=\"DEU\"");
        assert_eq!(settings.search.max_pages, None);
    }

    #[test]
    fn test_all_pages_conflicts_with_max_pages() {
        assert!(CliConfig::try_parse_from([
            "ted-search",
            "search",
            "--all-pages",
            "--max-pages",
            "2"
        ])
        .is_err());
    }

    #[test]
    fn test_flags_override_toml_profile() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[search]\nlimit = 20\nmax_pages = 9\n[export]\nname = \"profile\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap();

        let cli = parse(&["ted-search", "--config", path, "search", "--limit", "40"]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.search.limit, 40);
        assert_eq!(settings.search.max_pages, Some(9));
        assert_eq!(settings.export.name.as_deref(), Some("profile"));
    }

    #[test]
    fn test_health_subcommand_with_path() {
        let cli = parse(&[
            "ted-search",
            "health",
            "--path",
            "/status",
            "--base-url",
            "http://localhost:9",
        ]);
        let settings = cli.settings().unwrap();

        assert!(matches!(cli.command, Some(Command::Health { .. })));
        assert_eq!(settings.api.health_path, "/status");
        assert_eq!(settings.api.base_url, "http://localhost:9");
    }

    #[test]
    fn test_count_subcommand_takes_search_criteria() {
        let cli = parse(&[
            "ted-search",
            "count",
            "--cpv-lot",
            "45210000",
            "--gazette-issue",
            "2025/123",
        ]);
        let settings = cli.settings().unwrap();

        assert!(matches!(cli.command, Some(Command::Count(_))));
        assert_eq!(
            settings.search.query,
            "classification-cpv-lot=\"45210000\" AND gazette-issue-id=\"2025/123\""
        );
    }
}
