//! Symbolic-math oracle subprocess client.
//!
//! Difficult Akra–Bazzi integrals can optionally be handed to an
//! external symbolic-math process speaking line-delimited JSON:
//! a request `{type, g, p, variable}` on stdin, a response
//! `{success, integral_closed_form, integral_asymptotic,
//! full_solution_asymptotic, special_function, method, error}` on
//! stdout. The call blocks with a hard 30-second timeout; on timeout the
//! subprocess is killed. Every failure path is recoverable — the solver
//! falls back to its table, so this client never propagates errors
//! beyond a `None`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::AnalysisError;
use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::solvers::IntegralOracle;
use crate::speculation::parse_big_o;

/// Hard timeout for one oracle exchange.
pub const ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct OracleRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    g: String,
    p: f64,
    variable: &'a str,
}

#[derive(Debug, Deserialize)]
struct OracleResponse {
    success: bool,
    #[serde(default)]
    integral_closed_form: Option<String>,
    #[serde(default)]
    integral_asymptotic: Option<String>,
    #[serde(default)]
    full_solution_asymptotic: Option<String>,
    #[serde(default)]
    special_function: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the external symbolic-math process.
pub struct SymbolicOracle {
    command: Vec<String>,
    timeout: Duration,
}

impl SymbolicOracle {
    /// A client spawning `command` (program plus arguments) per query.
    pub fn new(command: Vec<String>) -> Self {
        SymbolicOracle {
            command,
            timeout: ORACLE_TIMEOUT,
        }
    }

    /// Override the hard timeout (tests).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self) -> Result<Child, AnalysisError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(AnalysisError::oracle_transport("empty oracle command"));
        };
        Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AnalysisError::oracle_transport(format!("spawn failed: {}", e)))
    }

    fn query(&self, request: &OracleRequest<'_>) -> Result<OracleResponse, AnalysisError> {
        let mut child = self.spawn()?;

        let payload = serde_json::to_string(request)
            .map_err(|e| AnalysisError::oracle_transport(format!("encode failed: {}", e)))?;
        {
            let Some(stdin) = child.stdin.as_mut() else {
                drop(child.kill());
                return Err(AnalysisError::oracle_transport("no stdin pipe"));
            };
            stdin
                .write_all(payload.as_bytes())
                .and_then(|()| stdin.write_all(b"\n"))
                .map_err(|e| AnalysisError::oracle_transport(format!("write failed: {}", e)))?;
        }
        drop(child.stdin.take());

        let Some(stdout) = child.stdout.take() else {
            drop(child.kill());
            return Err(AnalysisError::oracle_transport("no stdout pipe"));
        };

        // One reader thread, one line, received with a hard deadline.
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut line = String::new();
            let result = BufReader::new(stdout).read_line(&mut line).map(|_| line);
            drop(sender.send(result));
        });

        let line = match receiver.recv_timeout(self.timeout) {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                drop(child.kill());
                return Err(AnalysisError::oracle_transport(format!("read failed: {}", e)));
            }
            Err(_) => {
                drop(child.kill());
                drop(child.wait());
                return Err(AnalysisError::OracleTimeout);
            }
        };
        drop(child.wait());

        serde_json::from_str(line.trim())
            .map_err(|e| AnalysisError::oracle_transport(format!("malformed response: {}", e)))
    }
}

impl IntegralOracle for SymbolicOracle {
    fn solve_integral(&self, g: &Complexity, p: f64, var: &Variable) -> Option<Complexity> {
        let request = OracleRequest {
            kind: "akra_bazzi_integral",
            g: g.to_string(),
            p,
            variable: var.name(),
        };
        match self.query(&request) {
            Ok(response) if response.success => {
                debug!(
                    method = response.method.as_deref().unwrap_or("?"),
                    special = response.special_function.as_deref().unwrap_or(""),
                    closed_form = response.integral_closed_form.as_deref().unwrap_or(""),
                    "oracle answered"
                );
                let rendered = response
                    .full_solution_asymptotic
                    .or(response.integral_asymptotic)?;
                parse_big_o(&rendered).ok()
            }
            Ok(response) => {
                warn!(
                    error = response.error.as_deref().unwrap_or("unspecified"),
                    "oracle reported failure; using table fallback"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "oracle transport failed; using table fallback");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_recoverable_failure() {
        let oracle = SymbolicOracle::new(vec!["definitely-not-a-real-binary-9f2".to_owned()]);
        let g = Complexity::variable(Variable::n());
        assert!(oracle.solve_integral(&g, 1.0, &Variable::n()).is_none());
    }

    #[test]
    fn empty_command_is_rejected() {
        let oracle = SymbolicOracle::new(Vec::new());
        let g = Complexity::variable(Variable::n());
        assert!(oracle.solve_integral(&g, 1.0, &Variable::n()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn well_formed_response_is_parsed() {
        // `cat`-style echo via sh: reply with a fixed JSON line.
        let oracle = SymbolicOracle::new(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            r#"read _; echo '{"success":true,"full_solution_asymptotic":"O(n log n)","method":"table"}'"#
                .to_owned(),
        ]);
        let g = Complexity::variable(Variable::n());
        let solved = oracle.solve_integral(&g, 1.0, &Variable::n()).unwrap();
        assert_eq!(solved.big_o(), "O(n log n)");
    }

    #[cfg(unix)]
    #[test]
    fn hung_subprocess_times_out_and_dies() {
        let oracle = SymbolicOracle::new(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "sleep 60".to_owned(),
        ])
        .with_timeout(Duration::from_millis(200));
        let g = Complexity::variable(Variable::n());
        assert!(oracle.solve_integral(&g, 1.0, &Variable::n()).is_none());
    }
}
