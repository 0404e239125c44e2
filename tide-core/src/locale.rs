use serde::{Deserialize, Serialize};

/// Which language the bot speaks. Chosen once in config, never per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "en-US")]
    En,
    #[serde(rename = "zh-TW", alias = "zh_TW")]
    ZhTw,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::ZhTw => "zh-TW",
        }
    }

    pub fn default_command_name(&self) -> &'static str {
        match self {
            Locale::En => "tide",
            Locale::ZhTw => "潮汐查詢",
        }
    }

    pub fn default_command_description(&self) -> &'static str {
        match self {
            Locale::En => "Pick a location to see today's tide forecast",
            Locale::ZhTw => "選擇一個地點查看今日潮汐預報",
        }
    }

    pub fn picker_prompt(&self) -> &'static str {
        match self {
            Locale::En => "Please choose a location:",
            Locale::ZhTw => "請選擇地點：",
        }
    }

    pub fn picker_placeholder(&self) -> &'static str {
        match self {
            Locale::En => "Select a location",
            Locale::ZhTw => "請選擇地點",
        }
    }

    pub fn unknown_location(&self) -> &'static str {
        match self {
            Locale::En => "Unknown location",
            Locale::ZhTw => "未知地點",
        }
    }

    pub fn no_data(&self) -> &'static str {
        match self {
            Locale::En => "⚠️ No tide data found, please try again later.",
            Locale::ZhTw => "⚠️ 找不到潮汐資料，請稍後再試。",
        }
    }

    pub fn report_header(&self, location: &str) -> String {
        match self {
            Locale::En => format!("📍 {location} tide forecast for today:"),
            Locale::ZhTw => format!("📍 {location} 今日潮汐預報："),
        }
    }

    pub fn event_line(&self, time: &str, phase: &str, height_cm: i64) -> String {
        match self {
            Locale::En => format!("{time} - {phase} (Height: {height_cm}cm)"),
            Locale::ZhTw => format!("{time} - {phase}（潮高：{height_cm}cm）"),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Locale {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" => Ok(Locale::En),
            "zh-tw" => Ok(Locale::ZhTw),
            _ => Err(anyhow::anyhow!("Unknown locale '{value}'. Supported locales: en, zh-TW.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_event_line() {
        assert_eq!(Locale::En.event_line("05:30", "High", 120), "05:30 - High (Height: 120cm)");
    }

    #[test]
    fn chinese_event_line() {
        assert_eq!(Locale::ZhTw.event_line("05:30", "滿潮", 120), "05:30 - 滿潮（潮高：120cm）");
    }

    #[test]
    fn parses_locale_names() {
        assert_eq!(Locale::try_from("zh_tw").unwrap(), Locale::ZhTw);
        assert_eq!(Locale::try_from("EN").unwrap(), Locale::En);
        assert!(Locale::try_from("fr").is_err());
    }
}
