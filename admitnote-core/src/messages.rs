//! Localized user-facing strings.
//!
//! Keep these short; details belong in logs.

use crate::types::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Analyzing,
    Retrying { attempt: u32, max_attempts: u32 },
    RetryingIn { seconds: u64 },
    ParsingResponse,
    AnalysisDone,

    MissingApiKey,
    EmptyInput,
    ImageTooLarge { limit_mb: usize },
    InvalidApiKey,
    InvalidConfiguration,
    RateLimited,
    ServiceUnavailable,
    ModelNotFound,
    ServiceError { status: u16 },
    NetworkUnavailable,
    InvalidResponse,

    VoiceNotSupported,
    VoiceError { kind: String },
}

impl Message {
    pub fn text(&self, lang: Language) -> String {
        match lang {
            Language::ChineseTw => self.zh_tw(),
            Language::EnglishUs => self.en_us(),
        }
    }

    fn zh_tw(&self) -> String {
        match self {
            Message::Analyzing => "AI 分析中，請稍候...".into(),
            Message::Retrying {
                attempt,
                max_attempts,
            } => format!("重新嘗試中 ({attempt}/{max_attempts})..."),
            Message::RetryingIn { seconds } => format!("請求失敗，{seconds} 秒後重試..."),
            Message::ParsingResponse => "正在解析 AI 回應...".into(),
            Message::AnalysisDone => "AI 分析完成，已填入表單".into(),
            Message::MissingApiKey => "請先設定 Gemini API 金鑰".into(),
            Message::EmptyInput => "請輸入病歷內容或上傳圖片".into(),
            Message::ImageTooLarge { limit_mb } => format!("圖片過大，上限為 {limit_mb} MB"),
            Message::InvalidApiKey => "API 金鑰無效，請檢查設定".into(),
            Message::InvalidConfiguration => "設定無效，請檢查模型名稱與服務網址".into(),
            Message::RateLimited => "請求過於頻繁，請稍後再試".into(),
            Message::ServiceUnavailable => "AI 服務暫時無法使用，請稍後再試".into(),
            Message::ModelNotFound => "找不到指定的模型，請檢查模型設定".into(),
            Message::ServiceError { status } => format!("AI 服務錯誤 (代碼 {status})"),
            Message::NetworkUnavailable => "網路連線失敗，請檢查網路".into(),
            Message::InvalidResponse => "AI 回應格式無效，請重試".into(),
            Message::VoiceNotSupported => "此瀏覽器不支援語音辨識".into(),
            Message::VoiceError { kind } => match kind.as_str() {
                "no-speech" => "未偵測到語音，請再試一次".into(),
                "audio-capture" => "找不到麥克風".into(),
                "not-allowed" | "service-not-allowed" => "麥克風權限被拒絕".into(),
                "network" => "語音辨識網路錯誤".into(),
                "aborted" => "語音辨識已中止".into(),
                "language-not-supported" => "不支援此語言".into(),
                other => format!("語音辨識錯誤：{other}"),
            },
        }
    }

    fn en_us(&self) -> String {
        match self {
            Message::Analyzing => "Analyzing notes with AI...".into(),
            Message::Retrying {
                attempt,
                max_attempts,
            } => format!("Retrying ({attempt}/{max_attempts})..."),
            Message::RetryingIn { seconds } => {
                format!("Request failed, retrying in {seconds} seconds...")
            }
            Message::ParsingResponse => "Parsing AI response...".into(),
            Message::AnalysisDone => "AI analysis complete, form updated".into(),
            Message::MissingApiKey => "Please configure your Gemini API key first".into(),
            Message::EmptyInput => "Please enter clinical notes or attach an image".into(),
            Message::ImageTooLarge { limit_mb } => {
                format!("Image is too large (limit {limit_mb} MB)")
            }
            Message::InvalidApiKey => "Invalid API key, please check your settings".into(),
            Message::InvalidConfiguration => {
                "Invalid configuration, please check the model name and service URL".into()
            }
            Message::RateLimited => "Too many requests, please try again later".into(),
            Message::ServiceUnavailable => {
                "AI service is temporarily unavailable, please try again later".into()
            }
            Message::ModelNotFound => "Model not found, please check the model setting".into(),
            Message::ServiceError { status } => format!("AI service error (code {status})"),
            Message::NetworkUnavailable => {
                "Network connection failed, please check your connection".into()
            }
            Message::InvalidResponse => "Invalid AI response format, please try again".into(),
            Message::VoiceNotSupported => {
                "Speech recognition is not supported in this browser".into()
            }
            Message::VoiceError { kind } => match kind.as_str() {
                "no-speech" => "No speech detected, please try again".into(),
                "audio-capture" => "No microphone was found".into(),
                "not-allowed" | "service-not-allowed" => "Microphone permission denied".into(),
                "network" => "Speech recognition network error".into(),
                "aborted" => "Speech recognition aborted".into(),
                "language-not-supported" => "Language not supported".into(),
                other => format!("Speech recognition error: {other}"),
            },
        }
    }
}
