//! Shell Tool - 셸 명령 실행 도구
//!
//! 설정된 셸로 명령을 실행합니다.
//! - 실행 전 ShellCommandValidator 통과 필수 (치환 연산자, 금지 패턴)
//! - 파괴적 도구 (should_confirm = true)
//! - 타임아웃 + 협조적 취소 (프로세스 kill)
//! - 출력 크기 상한

use async_trait::async_trait;
use anvil_foundation::{
    command_validator, CancellationToken, CommandCheck, DeclarativeTool, Error, Result,
    ShellSettings, ToolEnv, ToolInvocation, ToolMeta, ToolOutput,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Shell 도구 입력
#[derive(Debug, Deserialize)]
pub struct ShellInput {
    /// 실행할 명령어
    pub command: String,

    /// 타임아웃 (밀리초, optional)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Shell 도구
pub struct ShellTool;

impl ShellTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "shell";
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for ShellTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Shell")
            .description("Execute a shell command in the working directory")
            .category("execute")
            .destructive(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (default: 120000)"
                }
            },
            "required": ["command"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: ShellInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid shell input: {}", e)))?;

        // 검증기 게이트 - spawn 전에, OS 샌드박스와 독립적으로
        match command_validator().validate(&parsed.command) {
            CommandCheck::Allowed => {}
            CommandCheck::Rejected { reason } => {
                return Err(Error::Security(format!(
                    "command rejected: {}",
                    reason
                )));
            }
        }

        Ok(Box::new(ShellInvocation {
            command: parsed.command,
            timeout_ms: parsed.timeout_ms.unwrap_or(env.shell.timeout_ms),
            working_dir: env.working_dir.clone(),
            shell: env.shell.clone(),
        }))
    }
}

/// Shell 호출
struct ShellInvocation {
    command: String,
    timeout_ms: u64,
    working_dir: PathBuf,
    shell: ShellSettings,
}

/// 출력 크기 상한 적용
fn clamp_output(output: &str, max_bytes: usize) -> (String, bool) {
    if output.len() <= max_bytes {
        return (output.to_string(), false);
    }
    // char 경계에서 자르기
    let mut end = max_bytes;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    (format!("{}\n... [output truncated]", &output[..end]), true)
}

#[async_trait]
impl ToolInvocation for ShellInvocation {
    fn description(&self) -> String {
        format!("Run `{}` in {}", self.command, self.working_dir.display())
    }

    fn should_confirm(&self) -> bool {
        true
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let shell_type = self.shell.shell_type;
        let mut command = Command::new(shell_type.executable());
        command
            .args(shell_type.exec_args())
            .arg(&self.command)
            .current_dir(&self.working_dir)
            .envs(&self.shell.env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;

        let timeout = Duration::from_millis(self.timeout_ms);
        let output = tokio::select! {
            result = tokio::time::timeout(timeout, child.wait_with_output()) => {
                match result {
                    Ok(output) => output?,
                    Err(_) => {
                        warn!("Command timed out after {}ms: {}", self.timeout_ms, self.command);
                        return Err(Error::Timeout(format!(
                            "command timed out after {}ms",
                            self.timeout_ms
                        )));
                    }
                }
            }
            _ = cancel.cancelled() => {
                // kill_on_drop이 프로세스를 정리
                return Err(Error::Cancelled);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut combined = String::new();
        if !stdout.is_empty() {
            combined.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str("stderr:\n");
            combined.push_str(&stderr);
        }
        if combined.is_empty() {
            combined.push_str("(no output)");
        }

        let (clamped, truncated) = clamp_output(&combined, self.shell.max_output_bytes);
        let mut content = clamped;
        if exit_code != 0 {
            content.push_str(&format!("\n[exit code: {}]", exit_code));
        }

        let summary = format!(
            "`{}` exited {}{}",
            self.command,
            exit_code,
            if truncated { " (output truncated)" } else { "" }
        );

        Ok(ToolOutput::new(content, summary))
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_foundation::WorkspaceBoundary;
    use tempfile::TempDir;

    fn env_for(dir: &TempDir) -> ToolEnv {
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        ToolEnv::new("test", dir.path(), boundary)
    }

    #[test]
    fn test_meta_destructive() {
        assert!(ShellTool::new().meta().destructive);
        assert_eq!(ShellTool::new().meta().category, "execute");
    }

    #[test]
    fn test_substitution_rejected_at_build() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let result = tool.build(json!({ "command": "echo $(whoami)" }), &env);
        assert!(matches!(result, Err(Error::Security(_))));

        let result = tool.build(json!({ "command": "echo `whoami`" }), &env);
        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[test]
    fn test_empty_command_rejected_at_build() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let result = tool.build(json!({ "command": "   " }), &env);
        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[test]
    fn test_clamp_output() {
        let (clamped, truncated) = clamp_output("short", 100);
        assert_eq!(clamped, "short");
        assert!(!truncated);

        let (clamped, truncated) = clamp_output(&"x".repeat(200), 100);
        assert!(truncated);
        assert!(clamped.contains("[output truncated]"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_simple_command() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let invocation = tool.build(json!({ "command": "echo hello" }), &env).unwrap();
        let output = invocation.execute(&CancellationToken::new()).await.unwrap();

        assert!(output.content.contains("hello"));
        assert!(output.summary.contains("exited 0"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reported() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let invocation = tool.build(json!({ "command": "exit 3" }), &env).unwrap();
        let output = invocation.execute(&CancellationToken::new()).await.unwrap();

        assert!(output.content.contains("[exit code: 3]"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let invocation = tool
            .build(json!({ "command": "sleep 5", "timeout_ms": 100 }), &env)
            .unwrap();
        let result = invocation.execute(&CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = ShellTool::new();

        let cancel = CancellationToken::new();
        let invocation = tool.build(json!({ "command": "sleep 5" }), &env).unwrap();

        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel_clone.cancel();
        });

        let result = invocation.execute(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
