use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use cropcare_common::{catalog, present, CaptureMode, Navigation};
use cropcare_rust::capture::{self, CaptureSession, FacingMode};
use cropcare_rust::cli::{Cli, Commands};
use cropcare_rust::config::Config;
use cropcare_rust::error::{CropCareError, Result};
use cropcare_rust::export::{self, PdfRenderer};
use cropcare_rust::predictor;
use cropcare_rust::session::SessionStore;
use cropcare_rust::source::ImageSource;
use cropcare_rust::telemetry;
use cropcare_rust::view::{self, AcceptPrompt, GatePrompt, InteractivePrompt};
use cropcare_rust::workflow::ScanWorkflow;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 撮影ビュー・結果ビュー間の遷移
enum Step {
    Upload(PathBuf),
    PromptUpload,
    Camera,
    Scan,
    View,
    Recover,
}

struct ViewOptions {
    no_view: bool,
    accept: bool,
    pdf: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);
    let mut config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Scan { file, no_view } => {
            println!("🌿 cropcare - 画像診断\n");
            let options = ViewOptions { no_view, accept: false, pdf: None };
            run(&config, cli.simulate, FacingMode::Environment, Step::Upload(file), &options).await?;
        }

        Commands::Capture { front, no_view } => {
            println!("📷 cropcare - カメラ診断\n");
            let facing = if front { FacingMode::User } else { FacingMode::Environment };
            let options = ViewOptions { no_view, accept: false, pdf: None };
            run(&config, cli.simulate, facing, Step::Camera, &options).await?;
        }

        Commands::Results { pdf, accept } => {
            let options = ViewOptions { no_view: false, accept, pdf };
            run(&config, cli.simulate, FacingMode::Environment, Step::View, &options).await?;
        }

        Commands::Catalog => {
            println!("病害カタログ:");
            for entry in catalog::entries() {
                let record = &entry.record;
                println!(
                    "  [{}] {} - {} ({}) 重症度: {}",
                    record.catalog_id.map(|id| id.to_string()).unwrap_or_default(),
                    record.crop,
                    record.disease,
                    record.status.as_str(),
                    record.severity
                );
            }
        }

        Commands::Config { show, set_endpoint, set_camera_url, set_simulate } => {
            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ 予測サービスのURLを設定しました");
            }

            if let Some(url) = set_camera_url {
                config.set_camera_url(url)?;
                println!("✔ カメラURLを設定しました");
            }

            if let Some(toggle) = set_simulate {
                config.set_simulate(toggle.is_on())?;
                println!("✔ シミュレーション: {}", if toggle.is_on() { "有効" } else { "無効" });
            }

            if show {
                println!("設定 ({}):", Config::config_path()?.display());
                println!("  予測サービス: {}", config.endpoint);
                println!("  カメラ: {}", config.camera_url.as_deref().unwrap_or("未設定"));
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  シミュレーション: {}", if config.simulate { "有効" } else { "無効" });
                println!("  セッション: {}", config.session_dir()?.display());
            }
        }
    }

    Ok(())
}

async fn run(
    config: &Config,
    simulate: bool,
    facing: FacingMode,
    first: Step,
    options: &ViewOptions,
) -> Result<()> {
    let session = SessionStore::new(&config.session_dir()?);
    let predictor = predictor::from_config(config, simulate)?;
    let mut workflow = ScanWorkflow::new(predictor, session.clone());
    let mut camera = CaptureSession::new(capture::backend_from_config(config)?).with_facing(facing);

    let mut step = first;
    loop {
        step = match step {
            Step::Upload(path) => match workflow.select(ImageSource::File(path)) {
                Ok(image) => {
                    println!(
                        "✔ 画像を選択: {} ({}x{})",
                        image.file_name, image.image.width, image.image.height
                    );
                    Step::Scan
                }
                Err(e) => recoverable(e)?,
            },

            Step::PromptUpload => Step::Upload(prompt_path()?),

            Step::Camera => {
                println!("- カメラを起動中...");
                match workflow.capture(&mut camera).await {
                    Ok(image) => {
                        println!("✔ 撮影しました ({}x{})", image.image.width, image.image.height);
                        Step::Scan
                    }
                    Err(e) => {
                        camera.close();
                        recoverable(e)?
                    }
                }
            }

            Step::Scan => {
                let spinner = spinner(&format!("診断中... ({})", workflow.predictor_name()));
                let result = workflow.scan().await;
                spinner.finish_and_clear();
                match result {
                    Ok(scan) => {
                        println!("✔ 診断完了: {} - {}", scan.record.crop, scan.record.disease);
                        if options.no_view {
                            println!("結果は `cropcare results` で表示できます");
                            return Ok(());
                        }
                        Step::View
                    }
                    Err(e) => recoverable(e)?,
                }
            }

            Step::View => match open_results(&session, options) {
                Ok(Navigation::ShowResult) => return Ok(()),
                Ok(Navigation::Capture(CaptureMode::Camera)) => Step::Camera,
                Ok(Navigation::Capture(CaptureMode::Upload)) => Step::PromptUpload,
                Err(CropCareError::MissingHandoffState) => {
                    println!("{}", CropCareError::MissingHandoffState);
                    return Ok(());
                }
                Err(e) => recoverable(e)?,
            },

            Step::Recover => match choose_recovery(workflow.current_image().is_some())? {
                Some(next) => next,
                None => return Ok(()),
            },
        };
    }
}

/// 利用者が再試行できるエラーは表示して復帰メニューへ
fn recoverable(error: CropCareError) -> Result<Step> {
    if error.is_recoverable() {
        println!("✗ {}", error);
        Ok(Step::Recover)
    } else {
        Err(error)
    }
}

fn choose_recovery(has_image: bool) -> Result<Option<Step>> {
    let mut items = Vec::new();
    if has_image {
        items.push(("もう一度診断する", Some(Step::Scan)));
    }
    items.push(("別の画像をアップロード", Some(Step::PromptUpload)));
    items.push(("カメラで撮影", Some(Step::Camera)));
    items.push(("終了", None));

    let labels: Vec<&str> = items.iter().map(|(label, _)| *label).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("どうしますか？")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| CropCareError::Prompt(e.to_string()))?;

    Ok(items.into_iter().nth(index).and_then(|(_, step)| step))
}

fn prompt_path() -> Result<PathBuf> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("画像ファイルのパス")
        .interact_text()
        .map_err(|e| CropCareError::Prompt(e.to_string()))?;
    Ok(PathBuf::from(input.trim()))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// 結果ビューを開く（引き継ぎレコードを消費する）
fn open_results(session: &SessionStore, options: &ViewOptions) -> Result<Navigation> {
    let scan = view::load(session)?;
    let result_view = present(&scan, Utc::now().timestamp_millis());

    let mut prompt: Box<dyn GatePrompt> = if options.accept {
        Box::new(AcceptPrompt)
    } else {
        Box::new(InteractivePrompt)
    };
    let shown = view::show(&result_view, prompt.as_mut(), &mut std::io::stdout().lock())?;

    if shown.navigation == Navigation::ShowResult {
        if let Some(output) = options.pdf.as_deref() {
            export_pdf(&result_view, shown.acknowledged, output);
        }
    }
    Ok(shown.navigation)
}

/// 失敗しても表示中の結果はそのまま（通知のみ）
fn export_pdf(
    result_view: &cropcare_common::ResultView,
    acknowledged: Option<cropcare_common::GateAction>,
    output: &Path,
) {
    println!("\n- PDFを生成中...");
    match export::export_view(result_view, acknowledged, &PdfRenderer::new(), output) {
        Ok(path) => println!("✔ PDF出力: {}", path.display()),
        Err(e) => println!("⚠ {}", e),
    }
}
