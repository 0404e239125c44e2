//! The command → menu → forecast flow.
//!
//! The controller keeps no session. A selection is recognised purely by the
//! menu's custom id, so each event can be handled on its own task.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::{
    config::Config,
    forecast::{self, TideForecastSource},
    locale::Locale,
    location::LocationDirectory,
    model::{ForecastQuery, ForecastTime, TideEvent},
};

/// Custom id of the location select menu.
pub const LOCATION_MENU_ID: &str = "tide_location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    StringSelect,
    Other(u8),
}

impl From<u8> for ComponentKind {
    fn from(value: u8) -> Self {
        match value {
            3 => ComponentKind::StringSelect,
            other => ComponentKind::Other(other),
        }
    }
}

/// An incoming interaction, reduced to the parts the bot looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    Command {
        name: String,
    },
    Component {
        kind: ComponentKind,
        custom_id: String,
        values: Vec<String>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
}

/// A "channel message with source" response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionReply {
    pub content: String,
    pub menu: Option<SelectMenu>,
    pub ephemeral: bool,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    directory: Arc<LocationDirectory>,
    forecasts: Arc<dyn TideForecastSource>,
    command_name: String,
    locale: Locale,
    timezone: Tz,
}

impl InteractionController {
    pub fn new(
        directory: Arc<LocationDirectory>,
        forecasts: Arc<dyn TideForecastSource>,
        command_name: impl Into<String>,
        locale: Locale,
        timezone: Tz,
    ) -> Self {
        Self { directory, forecasts, command_name: command_name.into(), locale, timezone }
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Today in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub async fn handle(&self, event: &InteractionEvent) -> Option<InteractionReply> {
        self.handle_on(event, self.today()).await
    }

    /// Like [`handle`](Self::handle) with an explicit "today".
    pub async fn handle_on(
        &self,
        event: &InteractionEvent,
        today: NaiveDate,
    ) -> Option<InteractionReply> {
        match event {
            InteractionEvent::Command { name } if *name == self.command_name => {
                Some(self.location_picker())
            }
            InteractionEvent::Component { kind: ComponentKind::StringSelect, custom_id, values }
                if custom_id == LOCATION_MENU_ID =>
            {
                let location_id = values.first()?;
                Some(self.forecast_reply(location_id, today).await)
            }
            _ => None,
        }
    }

    pub fn location_picker(&self) -> InteractionReply {
        let options = self
            .directory
            .search("")
            .into_iter()
            .map(|entry| SelectOption { label: entry.name.clone(), value: entry.id.clone() })
            .collect();

        InteractionReply {
            content: self.locale.picker_prompt().to_string(),
            menu: Some(SelectMenu {
                custom_id: LOCATION_MENU_ID.to_string(),
                placeholder: self.locale.picker_placeholder().to_string(),
                options,
            }),
            ephemeral: true,
        }
    }

    async fn forecast_reply(&self, location_id: &str, today: NaiveDate) -> InteractionReply {
        let name = self
            .directory
            .name_by_id(location_id)
            .unwrap_or_else(|| self.locale.unknown_location());

        let query = ForecastQuery::new(location_id, today);
        let content = match self.forecasts.get_forecast(&query).await {
            Some(times) if !times.is_empty() => render_report(self.locale, name, &times),
            _ => {
                debug!(location_id, date = %today, "replying with no-data warning");
                self.locale.no_data().to_string()
            }
        };

        InteractionReply { content, menu: None, ephemeral: false }
    }
}

/// Load the location directory and build the CWA client described by `config`.
pub fn controller_from_config(
    config: &Config,
    tide_api_token: &str,
) -> anyhow::Result<InteractionController> {
    let timezone = config.timezone()?;
    let directory = LocationDirectory::load(&config.locations_path)?;
    debug!(
        path = %config.locations_path.display(),
        locations = directory.len(),
        "location directory ready"
    );

    let forecasts: Arc<dyn TideForecastSource> =
        Arc::from(forecast::source_from_config(&config.tide_api, tide_api_token)?);

    Ok(InteractionController::new(
        Arc::new(directory),
        forecasts,
        config.command_spec().name,
        config.locale,
        timezone,
    ))
}

/// Header line plus one line per complete tide entry.
pub fn render_report(locale: Locale, location_name: &str, times: &[ForecastTime]) -> String {
    let mut lines = vec![locale.report_header(location_name)];
    lines.extend(
        times
            .iter()
            .filter_map(TideEvent::from_raw)
            .map(|event| locale.event_line(&event.clock_time(), &event.phase, event.height_cm)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct StubForecasts {
        response: Option<Vec<ForecastTime>>,
        queries: Mutex<Vec<ForecastQuery>>,
    }

    #[async_trait]
    impl TideForecastSource for StubForecasts {
        async fn get_forecast(&self, query: &ForecastQuery) -> Option<Vec<ForecastTime>> {
            self.queries.lock().await.push(query.clone());
            self.response.clone()
        }
    }

    fn time(value: serde_json::Value) -> ForecastTime {
        serde_json::from_value(value).unwrap()
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn controller(stub: Arc<StubForecasts>) -> InteractionController {
        let directory = LocationDirectory::from_entries([("X", "Anping"), ("Y", "Keelung")]);
        InteractionController::new(
            Arc::new(directory),
            stub,
            "tide",
            Locale::En,
            chrono_tz::Asia::Taipei,
        )
    }

    fn select(custom_id: &str, values: &[&str]) -> InteractionEvent {
        InteractionEvent::Component {
            kind: ComponentKind::StringSelect,
            custom_id: custom_id.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn command_renders_ephemeral_picker_with_every_location() {
        let ctl = controller(Arc::new(StubForecasts::default()));
        let reply = ctl
            .handle_on(&InteractionEvent::Command { name: "tide".into() }, june_first())
            .await
            .expect("command is answered");

        assert!(reply.ephemeral);
        assert_eq!(reply.content, "Please choose a location:");
        let menu = reply.menu.expect("picker has a menu");
        assert_eq!(menu.custom_id, LOCATION_MENU_ID);
        assert_eq!(
            menu.options,
            vec![
                SelectOption { label: "Anping".into(), value: "X".into() },
                SelectOption { label: "Keelung".into(), value: "Y".into() },
            ]
        );
    }

    #[tokio::test]
    async fn unrelated_command_is_ignored() {
        let ctl = controller(Arc::new(StubForecasts::default()));
        let reply =
            ctl.handle_on(&InteractionEvent::Command { name: "weather".into() }, june_first()).await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn selection_renders_forecast() {
        let stub = Arc::new(StubForecasts {
            response: Some(vec![
                time(json!({ "DateTime": "2024-06-01 05:30:00", "Tide": "High", "TideHeights": { "AboveChartDatum": 120 } })),
                time(json!({ "DateTime": "2024-06-01 11:40:00", "Tide": "Low", "TideHeights": {} })),
                time(json!({ "DateTime": "2024-06-01 17:55:00", "Tide": "High", "TideHeights": { "AboveChartDatum": 131 } })),
            ]),
            ..StubForecasts::default()
        });
        let ctl = controller(stub.clone());

        let reply = ctl.handle_on(&select(LOCATION_MENU_ID, &["X"]), june_first()).await.unwrap();

        assert!(!reply.ephemeral);
        assert!(reply.menu.is_none());
        assert_eq!(
            reply.content,
            "📍 Anping tide forecast for today:\n\
             05:30 - High (Height: 120cm)\n\
             17:55 - High (Height: 131cm)"
        );
        assert_eq!(*stub.queries.lock().await, vec![ForecastQuery::new("X", june_first())]);
    }

    #[tokio::test]
    async fn no_data_gives_warning() {
        let ctl = controller(Arc::new(StubForecasts::default()));
        let reply = ctl.handle_on(&select(LOCATION_MENU_ID, &["Y"]), june_first()).await.unwrap();
        assert_eq!(reply.content, Locale::En.no_data());
    }

    #[tokio::test]
    async fn unknown_location_uses_placeholder_name() {
        let stub = Arc::new(StubForecasts {
            response: Some(vec![time(json!({
                "DateTime": "2024-06-01 05:30:00",
                "Tide": "High",
                "TideHeights": { "AboveChartDatum": 120 }
            }))]),
            ..StubForecasts::default()
        });
        let ctl = controller(stub);

        let reply = ctl.handle_on(&select(LOCATION_MENU_ID, &["ZZZ"]), june_first()).await.unwrap();
        assert_eq!(
            reply.content,
            "📍 Unknown location tide forecast for today:\n05:30 - High (Height: 120cm)"
        );
    }

    #[tokio::test]
    async fn empty_forecast_gives_warning() {
        let stub = Arc::new(StubForecasts { response: Some(vec![]), ..StubForecasts::default() });
        let ctl = controller(stub);

        let reply = ctl.handle_on(&select(LOCATION_MENU_ID, &["X"]), june_first()).await.unwrap();
        assert_eq!(reply.content, Locale::En.no_data());
    }

    #[tokio::test]
    async fn other_component_ids_get_no_reply() {
        let stub = Arc::new(StubForecasts::default());
        let ctl = controller(stub.clone());

        assert!(ctl.handle_on(&select("something_else", &["X"]), june_first()).await.is_none());
        assert!(stub.queries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn non_select_component_with_menu_id_is_ignored() {
        let ctl = controller(Arc::new(StubForecasts::default()));
        let button = InteractionEvent::Component {
            kind: ComponentKind::from(2),
            custom_id: LOCATION_MENU_ID.into(),
            values: vec!["X".into()],
        };
        assert!(ctl.handle_on(&button, june_first()).await.is_none());
    }

    #[tokio::test]
    async fn empty_selection_is_ignored() {
        let ctl = controller(Arc::new(StubForecasts::default()));
        assert!(ctl.handle_on(&select(LOCATION_MENU_ID, &[]), june_first()).await.is_none());
        assert!(ctl.handle_on(&InteractionEvent::Other, june_first()).await.is_none());
    }

    #[test]
    fn controller_from_config_uses_configured_command_and_dataset() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"A1": "Anping"}}"#).unwrap();

        let config = Config {
            locations_path: file.path().to_path_buf(),
            locale: Locale::ZhTw,
            ..Config::default()
        };
        let ctl = controller_from_config(&config, "CWA-TOKEN").expect("valid config");

        assert_eq!(ctl.command_name(), "潮汐查詢");
        let menu = ctl.location_picker().menu.unwrap();
        assert_eq!(menu.options, vec![SelectOption { label: "Anping".into(), value: "A1".into() }]);
        assert_eq!(menu.placeholder, "請選擇地點");
    }

    #[test]
    fn controller_from_config_rejects_bad_timezone() {
        let config = Config { timezone: "Nowhere/Else".into(), ..Config::default() };
        assert!(controller_from_config(&config, "CWA-TOKEN").is_err());
    }

    #[test]
    fn report_in_traditional_chinese() {
        let times = vec![time(json!({
            "DateTime": "2024-06-01 05:30:00",
            "Tide": "滿潮",
            "TideHeights": { "AboveChartDatum": 120 }
        }))];
        assert_eq!(
            render_report(Locale::ZhTw, "安平", &times),
            "📍 安平 今日潮汐預報：\n05:30 - 滿潮（潮高：120cm）"
        );
    }
}
