//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 ember-script 覆盖率
//! - `script-check`: 检查 story cut 脚本文件（语法、诊断、往返一致性）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ember_script::{
    AudioOverrides, DiagnosticResult, EffectDefaults, EmberContext, Parser, analyze_script,
    extract_media_references, generate_script,
};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

/// 脚本文件扩展名
const SCRIPT_EXTENSIONS: &[&str] = &["txt", "cut"];

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p ember-script --all-features --html");
            cmd!(sh, "cargo llvm-cov -p ember-script --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "script-check" => {
            let path = args.next();
            let ember = args.next();
            script_check(path.as_deref(), ember.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 ember-script 覆盖率报告
  script-check    检查 story cut 脚本文件

SCRIPT-CHECK:
  cargo xtask script-check [path] [ember.json]

  不带参数：检查 scripts/ 下所有 .txt / .cut 文件
  带路径参数：检查指定文件或目录
  可选第二个参数：ember 上下文（媒体与已标记人物）

  检查内容：
    - 脚本语法错误
    - 诊断（媒体 id、zoom 锚点、时长与倍率、语音元数据）
    - 重新生成后是否与规范形式一致

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-core      -> cargo xtask cov-core
  cargo script-check  -> cargo xtask script-check
"#
    );
}

//=============================================================================
// script-check 命令实现
//=============================================================================

/// 默认脚本目录（相对于 workspace root）
const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// 脚本检查结果
#[derive(Default)]
struct ScriptCheckResult {
    scripts_checked: usize,
    parse_errors: usize,
    media_references: usize,
    diagnostics: DiagnosticResult,
    /// 重新生成后文本发生变化的脚本（非规范形式）
    not_canonical: Vec<String>,
}

/// 执行脚本检查
fn script_check(path: Option<&str>, ember_path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_SCRIPTS_DIR));
    let files = if root.is_file() {
        vec![root]
    } else if root.is_dir() {
        collect_script_files(&root)
    } else if path.is_none() {
        anyhow::bail!(
            "默认脚本目录不存在: {}\n请在 workspace 根目录运行，或指定脚本路径",
            root.display()
        );
    } else {
        anyhow::bail!("路径不存在: {}", root.display());
    };

    let ember: EmberContext = match ember_path {
        Some(p) => serde_json::from_str(&std::fs::read_to_string(p)?)?,
        None => EmberContext::default(),
    };

    if files.is_empty() {
        eprintln!("未找到脚本文件（{}）", SCRIPT_EXTENSIONS.join(" / "));
        return Ok(());
    }

    eprintln!("==> 检查 {} 个脚本文件...\n", files.len());

    let mut result = ScriptCheckResult::default();
    for file in &files {
        check_script_file(file, &ember, &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("脚本检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有脚本文件
fn collect_script_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    files
}

/// 检查单个脚本文件
fn check_script_file(file: &Path, ember: &EmberContext, result: &mut ScriptCheckResult) {
    let script_id = file.display().to_string();
    result.scripts_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", script_id, e);
            result.parse_errors += 1;
            return;
        }
    };

    let mut parser = Parser::new();
    let script = match parser.parse(&content) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", script_id, e);
            result.parse_errors += 1;
            return;
        }
    };

    for warning in parser.warnings() {
        eprintln!("[WARN] {}: {}", script_id, warning);
    }

    result.diagnostics.merge(analyze_script(&script_id, &script, ember));
    result.media_references += extract_media_references(&script).len();

    let store = script.to_store(EffectDefaults::default());
    let regenerated = generate_script(&script.blocks, &store, &AudioOverrides::new());
    if regenerated.trim() != content.trim() {
        result.not_canonical.push(script_id);
    }
}

/// 输出检查结果
fn print_check_result(result: &ScriptCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个脚本, {} 个媒体引用",
        result.scripts_checked, result.media_references
    );
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for script_id in &result.not_canonical {
        eprintln!(
            "[INFO] {}: 不是规范形式（可用 `ember normalize --write` 修正）",
            script_id
        );
    }

    let error_count = result.parse_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
