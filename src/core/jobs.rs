use super::models::{Category, ProtocolStatus, Target};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Dig,
    MailProbe,
    MiscProbe,
    Nmap,
    Sslscan,
    Testssl,
    Nikto,
    Dirb,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::Dig,
        Tool::MailProbe,
        Tool::MiscProbe,
        Tool::Nmap,
        Tool::Sslscan,
        Tool::Testssl,
        Tool::Nikto,
        Tool::Dirb,
    ];

    /// Config key under `[tools]`.
    pub fn key(self) -> &'static str {
        match self {
            Tool::Dig => "dig",
            Tool::MailProbe => "mail_probe",
            Tool::MiscProbe => "misc_probe",
            Tool::Nmap => "nmap",
            Tool::Sslscan => "sslscan",
            Tool::Testssl => "testssl",
            Tool::Nikto => "nikto",
            Tool::Dirb => "dirb",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    Parallel,
    Sequential,
}

/// What a job's command is pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argument {
    Host,
    /// Preferred web URL; jobs using this are only eligible when one exists.
    WebUrl,
    /// Preferred web URL, or `http://<target>` when neither protocol answered.
    WebUrlOrHttp,
}

#[derive(Debug)]
pub struct JobSpec {
    pub name: &'static str,
    pub tool: Tool,
    pub category: Category,
    pub filename: &'static str,
    pub group: Group,
    pub argument: Argument,
    pub eligible: fn(&ProtocolStatus) -> bool,
}

fn always(_: &ProtocolStatus) -> bool {
    true
}

fn any_web(status: &ProtocolStatus) -> bool {
    status.any_web()
}

fn https_only(status: &ProtocolStatus) -> bool {
    status.https_available()
}

/// Table order is execution order within each group.
pub static JOBS: &[JobSpec] = &[
    JobSpec {
        name: "dns_records",
        tool: Tool::Dig,
        category: Category::Dns,
        filename: "dns_results.txt",
        group: Group::Parallel,
        argument: Argument::Host,
        eligible: always,
    },
    JobSpec {
        name: "mail_ports",
        tool: Tool::MailProbe,
        category: Category::Mail,
        filename: "mail_results.txt",
        group: Group::Parallel,
        argument: Argument::Host,
        eligible: always,
    },
    JobSpec {
        name: "misc_checks",
        tool: Tool::MiscProbe,
        category: Category::Misc,
        filename: "misc_results.txt",
        group: Group::Parallel,
        argument: Argument::WebUrlOrHttp,
        eligible: always,
    },
    JobSpec {
        name: "nmap_full",
        tool: Tool::Nmap,
        category: Category::Network,
        filename: "nmap_results.txt",
        group: Group::Sequential,
        argument: Argument::Host,
        eligible: any_web,
    },
    JobSpec {
        name: "sslscan",
        tool: Tool::Sslscan,
        category: Category::Ssl,
        filename: "sslscan_results.txt",
        group: Group::Sequential,
        argument: Argument::Host,
        eligible: https_only,
    },
    JobSpec {
        name: "testssl",
        tool: Tool::Testssl,
        category: Category::Ssl,
        filename: "testssl_results.txt",
        group: Group::Sequential,
        argument: Argument::Host,
        eligible: https_only,
    },
    JobSpec {
        name: "nikto",
        tool: Tool::Nikto,
        category: Category::Web,
        filename: "nikto_results.txt",
        group: Group::Sequential,
        argument: Argument::WebUrl,
        eligible: any_web,
    },
    JobSpec {
        name: "dirb",
        tool: Tool::Dirb,
        category: Category::Web,
        filename: "dirb_results.txt",
        group: Group::Sequential,
        argument: Argument::WebUrl,
        eligible: any_web,
    },
];

impl JobSpec {
    pub fn is_eligible(&self, status: &ProtocolStatus) -> bool {
        (self.eligible)(status)
    }

    /// The host or URL this job is pointed at, or `None` when it has nothing to scan.
    pub fn resolve_argument(&self, target: &Target, status: &ProtocolStatus) -> Option<String> {
        match self.argument {
            Argument::Host => Some(target.to_string()),
            Argument::WebUrl => status.web_url(target),
            Argument::WebUrlOrHttp => {
                Some(status.web_url(target).unwrap_or_else(|| format!("http://{}", target)))
            }
        }
    }
}

/// Expands `{target}` and `{url}` in a command template. Substituted values are
/// shell-quoted; a template with no placeholder gets the argument appended.
pub fn expand_template(template: &str, target: &Target, argument: &str) -> String {
    let has_placeholder = template.contains("{target}") || template.contains("{url}");
    if !has_placeholder {
        return format!("{} {}", template.trim_end(), shell_words::quote(argument));
    }
    template
        .replace("{target}", &shell_words::quote(target.as_str()))
        .replace("{url}", &shell_words::quote(argument))
}
