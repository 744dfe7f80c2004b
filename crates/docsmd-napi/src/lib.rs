#![deny(clippy::all)]

use napi::bindgen_prelude::AsyncTask;
use napi::{Env, Task};
use napi_derive::napi;
use serde_json::Value;

use docsmd::{CodeBlocks, HeadingIds, LineBreaking, Suggestions, Underline};

#[napi(object)]
pub struct Options {
    pub code_blocks: Option<String>,
    pub heading_ids: Option<String>,
    pub suggestions: Option<String>,
    pub underline: Option<String>,
    pub linebreaking: Option<String>,
    pub spoiler: Option<bool>,
}

impl From<Options> for docsmd::Options {
    fn from(opts: Options) -> Self {
        let mut result = docsmd::Options::default();

        if let Some(style) = opts.code_blocks {
            result.code_blocks = match style.to_lowercase().as_str() {
                "fenced" => CodeBlocks::Fenced,
                _ => CodeBlocks::Indented,
            };
        }

        if let Some(ids) = opts.heading_ids {
            result.heading_ids = match ids.to_lowercase().as_str() {
                "html" => HeadingIds::Html,
                "extended" => HeadingIds::Extended,
                _ => HeadingIds::Hidden,
            };
        }

        if let Some(suggestions) = opts.suggestions {
            result.suggestions = match suggestions.to_lowercase().as_str() {
                "hide" => Suggestions::Hide,
                "html" => Suggestions::Html,
                _ => Suggestions::Show,
            };
        }

        if let Some(underline) = opts.underline {
            result.underline = match underline.to_lowercase().as_str() {
                "html" => Underline::Html,
                _ => Underline::Underscore,
            };
        }

        // Anything but the two known modes leaves line breaks alone
        if let Some(linebreaking) = opts.linebreaking {
            result.linebreaking = match linebreaking.to_lowercase().as_str() {
                "one" => LineBreaking::One,
                "backslash" => LineBreaking::Backslash,
                _ => LineBreaking::Keep,
            };
        }

        if let Some(spoiler) = opts.spoiler {
            result.spoiler = spoiler;
        }

        result
    }
}

fn to_napi_error(err: docsmd::Error) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}

pub struct ConvertTask {
    html: String,
    slice_clip: Option<Value>,
    options: docsmd::Options,
}

#[napi]
impl Task for ConvertTask {
    type Output = String;
    type JsValue = String;

    fn compute(&mut self) -> napi::Result<Self::Output> {
        docsmd::convert(&self.html, self.slice_clip.as_ref(), &self.options).map_err(to_napi_error)
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> napi::Result<Self::JsValue> {
        Ok(output)
    }
}

pub struct CombineTask {
    html: String,
    slice_clip: Option<Value>,
}

#[napi]
impl Task for CombineTask {
    type Output = String;
    type JsValue = String;

    fn compute(&mut self) -> napi::Result<Self::Output> {
        docsmd::combine_formats(&self.html, self.slice_clip.as_ref()).map_err(to_napi_error)
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> napi::Result<Self::JsValue> {
        Ok(output)
    }
}

/// Convert Google Docs HTML, optionally with its Slice Clip, to Markdown
#[napi(ts_return_type = "Promise<string>")]
pub fn convert(
    html: String,
    slice_clip: Option<Value>,
    options: Option<Options>,
) -> AsyncTask<ConvertTask> {
    AsyncTask::new(ConvertTask {
        html,
        slice_clip,
        options: options.map(Into::into).unwrap_or_default(),
    })
}

/// Merge a Slice Clip into Google Docs HTML
#[napi(ts_return_type = "Promise<string>")]
pub fn combine_formats(html: String, slice_clip: Option<Value>) -> AsyncTask<CombineTask> {
    AsyncTask::new(CombineTask { html, slice_clip })
}
