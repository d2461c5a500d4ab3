//! Troubleshooting hints attached to execution failures
//!
//! Matching is a pure function of the lowercased primary error text. Rules are
//! evaluated in table order and the first match wins, so adding a hint means
//! adding one row to [`RULES`].

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Advice selected from the text of a backend error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    /// Database file missing or unreadable
    MissingFile,
    /// Credentials rejected
    Authentication,
    /// SQL Server instance unreachable or misnamed
    InstanceNotFound,
    /// Connection or command timed out
    Timeout,
}

struct Rule {
    guidance: Guidance,
    pattern: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        guidance: Guidance::MissingFile,
        pattern: r"unable to open|could not find|no such file",
    },
    Rule {
        guidance: Guidance::Authentication,
        pattern: r"login failed|authentication|cannot open database",
    },
    Rule {
        guidance: Guidance::InstanceNotFound,
        pattern: r"(?s)instance failure|server.*(not found|cannot connect)|(not found|cannot connect).*server",
    },
    Rule {
        guidance: Guidance::Timeout,
        pattern: r"timeout|timed out",
    },
];

static COMPILED: LazyLock<Vec<(Guidance, Regex)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(re) => Some((rule.guidance, re)),
            Err(e) => {
                tracing::error!("invalid guidance pattern {:?}: {}", rule.pattern, e);
                None
            }
        })
        .collect()
});

impl Guidance {
    /// Every hint, in evaluation order
    pub const ALL: [Guidance; 4] = [
        Guidance::MissingFile,
        Guidance::Authentication,
        Guidance::InstanceNotFound,
        Guidance::Timeout,
    ];

    /// Pick the first hint whose rule matches `message`
    pub fn detect(message: &str) -> Option<Guidance> {
        let lower = message.to_lowercase();
        COMPILED
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(guidance, _)| *guidance)
    }

    pub fn tips(&self) -> &'static str {
        match self {
            Guidance::MissingFile => {
                "Tips:\n\
                 - Check the database file path\n\
                 - Make sure the database file exists\n\
                 - Check that you have permission to read the file"
            }
            Guidance::Authentication => {
                "Tips:\n\
                 - Check the user name and password\n\
                 - Check that the login has access to the database\n\
                 - Check Integrated Security in the connection string"
            }
            Guidance::InstanceNotFound => {
                "Troubleshooting an unreachable SQL Server instance:\n\n\
                 1. Instance name\n\
                 \x20  - Named instance: Server=host\\INSTANCE\n\
                 \x20  - Default instance: Server=host (no \\INSTANCE)\n\
                 \x20  - Data Source=host\\INSTANCE works the same way\n\n\
                 2. SQL Server service\n\
                 \x20  - Open the service manager and find SQL Server (INSTANCE) or SQL Server (MSSQLSERVER)\n\
                 \x20  - Make sure it is running, and start it if it is stopped\n\n\
                 3. SQL Server Configuration Manager\n\
                 \x20  - Under SQL Server Services, check the instance status is Running\n\
                 \x20  - Check that TCP/IP is enabled for the instance\n\n\
                 4. SQL Server Browser (named instances)\n\
                 \x20  - Make sure the SQL Server Browser service is running\n\
                 \x20  - Its startup type should be Automatic\n\
                 \x20  - UDP port 1434 must be reachable from this machine\n\n\
                 5. Test with another client\n\
                 \x20  - Connect with SSMS or sqlcmd using the same server name\n\
                 \x20  - If that works, compare its settings with this connection string\n\n\
                 6. Connection string format\n\
                 \x20  - A doubled backslash (host\\\\INSTANCE) is collapsed to a single one\n\
                 \x20  - Example: Data Source=host\\INSTANCE;Initial Catalog=MyDb;Integrated Security=True;\n\n\
                 7. Exact instance name\n\
                 \x20  - List the installed instances on the server and copy the name exactly"
            }
            Guidance::Timeout => {
                "Tips:\n\
                 - Increase Connect Timeout in the connection string\n\
                 - Check that the server is reachable\n\
                 - The query may be running too long"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert_eq!(
            Guidance::detect("unable to open database file"),
            Some(Guidance::MissingFile)
        );
        assert_eq!(
            Guidance::detect("No such file or directory (os error 2)"),
            Some(Guidance::MissingFile)
        );
    }

    #[test]
    fn test_authentication() {
        assert_eq!(
            Guidance::detect("Login failed for user 'sa'."),
            Some(Guidance::Authentication)
        );
        assert_eq!(
            Guidance::detect("Cannot open database \"Portal\" requested by the login."),
            Some(Guidance::Authentication)
        );
    }

    #[test]
    fn test_instance_not_found() {
        assert_eq!(
            Guidance::detect("Instance failure."),
            Some(Guidance::InstanceNotFound)
        );
        assert_eq!(
            Guidance::detect("The server was not found or was not accessible"),
            Some(Guidance::InstanceNotFound)
        );
        assert_eq!(
            Guidance::detect("cannot connect to SERVER db01"),
            Some(Guidance::InstanceNotFound)
        );
        assert_eq!(Guidance::detect("table not found"), None);
    }

    #[test]
    fn test_timeout() {
        assert_eq!(
            Guidance::detect("Connection timed out after 15 seconds"),
            Some(Guidance::Timeout)
        );
        assert_eq!(
            Guidance::detect("Execution Timeout Expired"),
            Some(Guidance::Timeout)
        );
    }

    #[test]
    fn test_first_rule_wins() {
        // Matches both the file rule and the timeout rule.
        assert_eq!(
            Guidance::detect("unable to open file: timeout"),
            Some(Guidance::MissingFile)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(Guidance::detect("near \"SELEC\": syntax error"), None);
    }

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(COMPILED.len(), RULES.len());
        for (guidance, rule) in Guidance::ALL.iter().zip(RULES) {
            assert_eq!(*guidance, rule.guidance);
            assert!(!guidance.tips().is_empty());
        }
    }
}
