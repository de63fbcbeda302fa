use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{summarize_stderr, EngineError, EngineOutput, EngineRequest, OcrEngine, ScratchArea};
use crate::job::EngineKind;

const NOT_INSTALLED: &str =
    "OCRmyPDF is not installed. Install the ocrmypdf package and the Tesseract dependencies.";

/// Classical OCR through the `ocrmypdf` command line.
#[derive(Debug, Clone)]
pub struct OcrmypdfEngine {
    program: String,
    extra_args: Vec<String>,
    scratch_dir: Option<PathBuf>,
}

impl Default for OcrmypdfEngine {
    fn default() -> Self {
        Self::new("ocrmypdf", Vec::new())
    }
}

impl OcrmypdfEngine {
    /// `extra_args` go before the generated flags (e.g. a script path when
    /// `program` is an interpreter).
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
            scratch_dir: None,
        }
    }

    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    fn build_args(
        request: &EngineRequest,
        input: &Path,
        output: &Path,
        sidecar: Option<&Path>,
    ) -> Vec<OsString> {
        let options = &request.options;
        let mut args: Vec<OsString> = Vec::new();

        if let Some(languages) = request.languages.joined() {
            args.push("--language".into());
            args.push(languages.into());
        }

        args.push("--optimize".into());
        args.push(options.optimize.to_string().into());

        let flags = [
            (options.deskew, "--deskew"),
            (options.rotate_pages, "--rotate-pages"),
            (options.remove_background, "--remove-background"),
            (options.clean_final, "--clean-final"),
            (options.skip_text, "--skip-text"),
            (options.force_ocr, "--force-ocr"),
        ];
        for (enabled, flag) in flags {
            if enabled {
                args.push(flag.into());
            }
        }

        args.push("--output-type".into());
        args.push(options.output_type.as_str().into());

        if let Some(sidecar) = sidecar {
            args.push("--sidecar".into());
            args.push(sidecar.into());
        }

        args.push(input.into());
        args.push(output.into());
        args
    }
}

/// Maps an ocrmypdf exit code to an engine error.
fn error_for_exit(code: Option<i32>, stderr: &[u8]) -> EngineError {
    let detail = summarize_stderr(stderr);
    let with_detail = |base: &str| match &detail {
        Some(d) => format!("{}: {}", base, d),
        None => base.to_string(),
    };

    match code {
        Some(3) => EngineError::Unavailable(with_detail("OCRmyPDF is missing a required dependency")),
        Some(6) => EngineError::Processing(
            "Prior OCR found: page already has text. Enable skip_text or force_ocr to process this document."
                .to_string(),
        ),
        Some(4) => EngineError::Output(with_detail("OCRmyPDF produced an invalid output document")),
        Some(1) => EngineError::Processing(with_detail("OCRmyPDF rejected its arguments")),
        Some(2) => EngineError::Processing(with_detail("The input file is not a readable PDF")),
        Some(7) => EngineError::Processing(with_detail("An OCRmyPDF helper program failed")),
        Some(8) => EngineError::Processing(with_detail("The PDF is encrypted")),
        Some(9) => EngineError::Processing(with_detail("Invalid OCRmyPDF configuration")),
        Some(code) => EngineError::Processing(with_detail(&format!(
            "OCRmyPDF failed with exit code {}",
            code
        ))),
        None => EngineError::Processing(with_detail("OCRmyPDF was terminated by a signal")),
    }
}

#[async_trait]
impl OcrEngine for OcrmypdfEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Ocrmypdf
    }

    async fn run(&self, input: &[u8], request: &EngineRequest) -> Result<EngineOutput, EngineError> {
        let scratch = ScratchArea::new(self.scratch_dir.as_deref())?;
        let input_path = scratch.write_input(input).await?;
        let output_path = scratch.output_path();
        let sidecar_path = request.options.make_sidecar.then(|| scratch.sidecar_path());

        let args = Self::build_args(request, &input_path, &output_path, sidecar_path.as_deref());
        tracing::debug!(program = %self.program, ?args, "Running ocrmypdf");

        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::Unavailable(NOT_INSTALLED.to_string())
                } else {
                    EngineError::Processing(format!("Failed to run ocrmypdf: {}", e))
                }
            })?;

        if !output.status.success() {
            let error = error_for_exit(output.status.code(), &output.stderr);
            tracing::warn!(code = ?output.status.code(), error = %error, "ocrmypdf failed");
            return Err(error);
        }

        let pdf = match tokio::fs::read(&output_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(EngineError::Output(
                    "OCRmyPDF finished without producing an output document".to_string(),
                ))
            }
        };

        let sidecar_text = match &sidecar_path {
            Some(path) => tokio::fs::read(path)
                .await
                .ok()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            None => None,
        };

        Ok(EngineOutput {
            pdf,
            sidecar_text,
            detected_languages: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{LanguageSelection, OcrOptions, OutputType};

    fn args_as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_args_for_explicit_languages() {
        let request = EngineRequest {
            languages: LanguageSelection::Explicit(vec!["ron".to_string(), "eng".to_string()]),
            options: OcrOptions {
                optimize: 2,
                deskew: true,
                force_ocr: true,
                output_type: OutputType::Pdfa2,
                make_sidecar: true,
                ..OcrOptions::default()
            },
        };
        let args = OcrmypdfEngine::build_args(
            &request,
            Path::new("/s/input.pdf"),
            Path::new("/s/output.pdf"),
            Some(Path::new("/s/sidecar.txt")),
        );

        assert_eq!(
            args_as_strings(&args),
            [
                "--language",
                "ron+eng",
                "--optimize",
                "2",
                "--deskew",
                "--force-ocr",
                "--output-type",
                "pdfa-2",
                "--sidecar",
                "/s/sidecar.txt",
                "/s/input.pdf",
                "/s/output.pdf",
            ]
        );
    }

    #[test]
    fn test_auto_detect_omits_language_flag() {
        let request = EngineRequest {
            languages: LanguageSelection::Auto,
            options: OcrOptions::default(),
        };
        let args = args_as_strings(&OcrmypdfEngine::build_args(
            &request,
            Path::new("in.pdf"),
            Path::new("out.pdf"),
            None,
        ));

        assert!(!args.contains(&"--language".to_string()));
        assert!(!args.contains(&"--sidecar".to_string()));
        assert_eq!(args[..2], ["--optimize", "1"]);
    }

    #[test]
    fn test_exit_code_mapping() {
        assert!(matches!(error_for_exit(Some(3), b""), EngineError::Unavailable(_)));
        assert!(matches!(error_for_exit(Some(4), b""), EngineError::Output(_)));
        assert!(matches!(error_for_exit(Some(8), b""), EngineError::Processing(_)));

        let prior = error_for_exit(Some(6), b"page already has text! - aborting");
        assert!(prior.to_string().contains("page already has text"));

        let other = error_for_exit(Some(15), b"ERROR: something odd");
        assert_eq!(
            other,
            EngineError::Processing("OCRmyPDF failed with exit code 15: ERROR: something odd".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let engine = OcrmypdfEngine::new("ocrportal-no-such-ocrmypdf", Vec::new());
        let request = EngineRequest {
            languages: LanguageSelection::Auto,
            options: OcrOptions::default(),
        };

        let err = engine.run(b"%PDF-1.4", &request).await.unwrap_err();
        assert_eq!(err, EngineError::Unavailable(NOT_INSTALLED.to_string()));
    }
}
