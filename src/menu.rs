// ============================================================================
// INTERACTIVE MENU — prompt-driven editing of a single image
// ============================================================================
//
// Every answer is validated and re-asked until it parses. End of input at
// any prompt aborts the menu with an error; nothing is saved in that case.
// A failed save is reported and the menu carries on.
// ============================================================================

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::io::{IoError, is_supported_image};
use crate::ops::{Channel, Color, KernelKind, Preset, TransformParameters};
use crate::session::Session;
use crate::settings::Settings;
use crate::{log_err, log_info, log_warn};

const MENU: &str = "\
Choose a transform:
   1) Grayscale
   2) Replace background
   3) Recolor dominant channel
   4) Color mask
   5) Contrast / brightness
   6) Preset (warm, cool, vintage, sepia)
   7) Gradient overlay
   8) Sharpen
   9) Blur
  10) Transparency
   u) Undo last step
   r) Revert to original
   s) Save and quit
   q) Quit without saving";

struct Prompter<'a, R, W> {
    input: &'a mut R,
    out: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    fn say(&mut self, msg: &str) -> Result<(), String> {
        writeln!(self.out, "{}", msg).map_err(|e| e.to_string())
    }

    /// Print `prompt` and read one trimmed line.
    fn ask(&mut self, prompt: &str) -> Result<String, String> {
        write!(self.out, "{}", prompt).map_err(|e| e.to_string())?;
        self.out.flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("input ended before the menu finished".to_string());
        }
        Ok(line.trim().to_string())
    }

    /// Ask until `parse` accepts the answer, printing its error each time.
    fn ask_parsed<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, String> {
        loop {
            let answer = self.ask(prompt)?;
            match parse(&answer) {
                Ok(v) => return Ok(v),
                Err(e) => self.say(&format!("Invalid input: {}", e))?,
            }
        }
    }

    fn ask_color(&mut self, prompt: &str) -> Result<Color, String> {
        self.ask_parsed(prompt, |s| s.parse::<Color>())
    }

    /// Empty answer keeps `default`.
    fn ask_threshold(&mut self, prompt: &str, default: u8) -> Result<u8, String> {
        let prompt = format!("{} [{}]: ", prompt, default);
        self.ask_parsed(&prompt, |s| {
            if s.is_empty() {
                return Ok(default);
            }
            s.parse::<u8>().map_err(|_| format!("'{}' is not a value between 0 and 255", s))
        })
    }

    fn ask_factor(&mut self, prompt: &str) -> Result<f32, String> {
        self.ask_parsed(prompt, |s| {
            if s.is_empty() {
                return Ok(1.0);
            }
            match s.parse::<f32>() {
                Ok(v) if v.is_finite() && (0.0..=2.0).contains(&v) => Ok(v),
                _ => Err(format!("'{}' is not a number between 0.0 and 2.0", s)),
            }
        })
    }
}

/// Normalise a typed path: surrounding quotes dropped, backslashes become slashes.
pub fn clean_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    PathBuf::from(trimmed.replace('\\', "/"))
}

/// Run the menu. Returns the saved path, or `None` when the user quit without saving.
pub fn run<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    settings: &Settings,
) -> Result<Option<PathBuf>, String> {
    let mut p = Prompter { input, out };

    let mut session = open_session(&mut p)?.with_max_undo_steps(settings.max_undo_steps);
    p.say("Image loaded successfully.")?;

    loop {
        p.say("")?;
        p.say(MENU)?;
        let choice = p.ask("> ")?.to_lowercase();

        let params = match choice.as_str() {
            "s" => match session.save_default(settings) {
                Ok(path) => {
                    p.say(&format!("Image saved successfully at {}", path.display()))?;
                    return Ok(Some(path));
                }
                Err(e) => {
                    log_err!("Menu save failed: {}", e);
                    p.say(&format!("An error occurred while saving the image: {}", e))?;
                    continue;
                }
            },
            "q" => {
                p.say("Quit without saving.")?;
                return Ok(None);
            }
            "u" => {
                if session.undo() {
                    p.say("Undid last step.")?;
                } else {
                    p.say("Nothing to undo.")?;
                }
                continue;
            }
            "r" => {
                session.revert();
                p.say("Reverted to the original image.")?;
                continue;
            }
            other => match ask_params(&mut p, other, settings)? {
                Some(params) => params,
                None => {
                    p.say(&format!("Invalid choice '{}'.", other))?;
                    continue;
                }
            },
        };

        match session.apply(&params) {
            Ok(()) => p.say("Image changed successfully")?,
            Err(e) => {
                log_warn!("Menu transform {} failed: {}", params.name(), e);
                p.say(&format!("An error occurred while processing the image: {}", e))?;
            }
        }
    }
}

fn open_session<R: BufRead, W: Write>(p: &mut Prompter<'_, R, W>) -> Result<Session, String> {
    loop {
        let path = clean_path(&p.ask("Enter the image path: ")?);
        if !is_supported_image(&path) {
            p.say("Invalid image path. Please enter a png, jpg, jpeg, bmp, tga or tiff file.")?;
            continue;
        }
        match Session::open(&path) {
            Ok(session) => return Ok(session),
            Err(IoError::NotFound(_)) => {
                p.say(&format!("Error: The file at '{}' does not exist.", path.display()))?;
            }
            Err(e) => {
                log_info!("Menu could not open {}: {}", path.display(), e);
                p.say("Error: The image could not be opened. Please check the file and try again.")?;
            }
        }
    }
}

/// Prompt for the parameters of menu entry `choice`; `None` if the entry is unknown.
fn ask_params<R: BufRead, W: Write>(
    p: &mut Prompter<'_, R, W>,
    choice: &str,
    settings: &Settings,
) -> Result<Option<TransformParameters>, String> {
    let params = match choice {
        "1" => TransformParameters::Grayscale,
        "2" => {
            let new_color = p.ask_color("New background color, e.g. (255, 255, 255): ")?;
            let threshold = p.ask_threshold("Black threshold", settings.background_threshold)?;
            TransformParameters::BackgroundReplace { new_color, threshold }
        }
        "3" => {
            let target = p.ask_color("Enter the target color in RGB format (e.g., (102, 147, 163)): ")?;
            let channel = p.ask_parsed(
                "Which color to change (r (red), g (green), or b (blue)): ",
                |s| s.parse::<Channel>(),
            )?;
            TransformParameters::Recolor { target, channel }
        }
        "4" => {
            let mask_color = p.ask_color("Mask color, e.g. (9, 9, 9): ")?;
            let threshold = p.ask_threshold("Dark threshold", settings.mask_threshold)?;
            TransformParameters::ColorMask { mask_color, threshold }
        }
        "5" => {
            let contrast = p.ask_factor("Contrast factor 0.0-2.0 [1.0]: ")?;
            let brightness = p.ask_factor("Brightness factor 0.0-2.0 [1.0]: ")?;
            TransformParameters::ContrastBrightness { contrast, brightness }
        }
        "6" => {
            let preset = p.ask_parsed("Preset (warm, cool, vintage, sepia): ", |s| {
                s.parse::<Preset>()
            })?;
            TransformParameters::Preset(preset)
        }
        "7" => {
            let from = p.ask_color("Top color, e.g. (255, 0, 0): ")?;
            let to = p.ask_color("Bottom color, e.g. (0, 0, 255): ")?;
            TransformParameters::Gradient { from, to }
        }
        "8" => TransformParameters::SharpenBlur(KernelKind::Sharpen),
        "9" => TransformParameters::SharpenBlur(KernelKind::Blur),
        "10" => {
            let level = p.ask_parsed("Transparency level 0-255: ", |s| {
                s.parse::<u8>().map_err(|_| format!("'{}' is not a value between 0 and 255", s))
            })?;
            TransformParameters::Transparency { level }
        }
        _ => return Ok(None),
    };
    Ok(Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_script(script: &str) -> (Result<Option<PathBuf>, String>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = run(&mut input, &mut out, &Settings::default());
        (result, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn cleans_quoted_windows_paths() {
        assert_eq!(clean_path("\"C:\\img\\a.png\""), PathBuf::from("C:/img/a.png"));
        assert_eq!(clean_path("  'a.jpg' "), PathBuf::from("a.jpg"));
    }

    #[test]
    fn rejects_unsupported_then_missing_paths() {
        let (result, out) = run_script("notes.txt\nmissing/definitely.png\n");
        assert!(result.is_err());
        assert!(out.contains("Invalid image path"));
        assert!(out.contains("does not exist"));
    }

    #[test]
    fn ask_color_reprompts_until_valid() {
        let mut input = Cursor::new(b"(300, 0, 0)\nred\n(1, 2, 3)\n".to_vec());
        let mut out = Vec::new();
        let mut p = Prompter { input: &mut input, out: &mut out };
        assert_eq!(p.ask_color("? ").unwrap(), Color::new(1, 2, 3));
        let text = String::from_utf8_lossy(&out).into_owned();
        assert_eq!(text.matches("Invalid input").count(), 2);
    }

    #[test]
    fn threshold_defaults_on_empty_answer() {
        let mut input = Cursor::new(b"\n".to_vec());
        let mut out = Vec::new();
        let mut p = Prompter { input: &mut input, out: &mut out };
        assert_eq!(p.ask_threshold("t", 30).unwrap(), 30);
    }

    #[test]
    fn unknown_choice_yields_none() {
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();
        let mut p = Prompter { input: &mut input, out: &mut out };
        assert_eq!(ask_params(&mut p, "42", &Settings::default()).unwrap(), None);
    }
}
