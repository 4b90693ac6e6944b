//! # Ember CLI
//!
//! story cut 脚本命令行工具。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p ember-cli -- init-config
//! cargo run -p ember-cli -- check cut.txt
//! cargo run -p ember-cli -- display cut.txt
//! cargo run -p ember-cli -- reconstruct edited.txt --original cut.txt
//! cargo run -p ember-cli -- styles cut.txt --ember ember-ctx.json
//! cargo run -p ember-cli -- inspect cut.txt
//! cargo run -p ember-cli -- normalize cut.txt --write
//! ```

mod commands;
mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::{AppConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "story cut 脚本工具 - 检查、展示、重建与样式解析")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：ember.json）
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// ember 上下文文件，覆盖配置中的 ember_path
    #[arg(long, global = true)]
    ember: Option<PathBuf>,

    /// story cut 上下文文件，覆盖配置中的 story_cut_path
    #[arg(long, global = true)]
    story_cut: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 写入默认配置文件
    InitConfig {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 解析脚本并运行诊断
    Check {
        /// 脚本文件
        file: PathBuf,
    },

    /// 输出展示文本（隐藏 id 与音频偏好）
    Display {
        /// 脚本文件
        file: PathBuf,
    },

    /// 由编辑后的展示文本重建原始脚本
    Reconstruct {
        /// 编辑后的展示文本
        edited: PathBuf,

        /// 原始脚本
        #[arg(short, long)]
        original: PathBuf,
    },

    /// 输出每个媒体块的样式描述（JSON）
    Styles {
        /// 脚本文件
        file: PathBuf,
    },

    /// 输出效果状态快照（JSON）
    Inspect {
        /// 脚本文件
        file: PathBuf,
    },

    /// 解析后重新生成规范形式
    Normalize {
        /// 脚本文件
        file: PathBuf,

        /// 写回原文件
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, load_error) = AppConfig::load(&cli.config);
    if let Some(path) = &cli.ember {
        config.ember_path = Some(path.clone());
    }
    if let Some(path) = &cli.story_cut {
        config.story_cut_path = Some(path.clone());
    }

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.level()
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(e) = load_error {
        tracing::warn!(path = %cli.config.display(), error = %e, "配置文件无法加载，使用默认配置");
    }
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "配置无效");
    }

    match real_main(cli.command, &config, &cli.config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ember error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main(
    command: Commands,
    config: &AppConfig,
    config_path: &Path,
) -> anyhow::Result<ExitCode> {
    match command {
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", config_path.display());
            }
            AppConfig::default()
                .save(config_path)
                .with_context(|| format!("写入配置失败: {}", config_path.display()))?;
            tracing::info!(path = %config_path.display(), "已写入默认配置");
        }
        Commands::Check { file } => {
            let ember = config.load_ember().context("读取 ember 上下文失败")?;
            let script_id = file.display().to_string();
            let report = commands::check(config, &ember, &script_id, &read(&file)?)?;
            eprintln!("{}", report.render(&script_id));
            if report.has_errors() {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Display { file } => {
            let ember = config.load_ember().context("读取 ember 上下文失败")?;
            let story_cut = config.load_story_cut().context("读取 story cut 上下文失败")?;
            println!("{}", commands::display(&ember, &story_cut, &read(&file)?));
        }
        Commands::Reconstruct { edited, original } => {
            let story_cut = config.load_story_cut().context("读取 story cut 上下文失败")?;
            let rebuilt = commands::rebuild(&story_cut, &read(&edited)?, &read(&original)?)?;
            println!("{}", rebuilt);
        }
        Commands::Styles { file } => {
            let ember = config.load_ember().context("读取 ember 上下文失败")?;
            let script_id = file.display().to_string();
            let styles = commands::styles(config, &ember, &script_id, &read(&file)?)?;
            println!("{}", serde_json::to_string_pretty(&styles)?);
        }
        Commands::Inspect { file } => {
            let script_id = file.display().to_string();
            println!("{}", commands::inspect(config, &script_id, &read(&file)?)?);
        }
        Commands::Normalize { file, write } => {
            let script_id = file.display().to_string();
            let normalized = commands::normalize(config, &script_id, &read(&file)?)?;
            if write {
                fs::write(&file, format!("{}\n", normalized))
                    .with_context(|| format!("写入失败: {}", file.display()))?;
                tracing::info!(path = %file.display(), "已写回规范形式");
            } else {
                println!("{}", normalized);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("无法读取文件: {}", path.display()))
}
