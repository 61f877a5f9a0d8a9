use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serenity::async_trait;
use tracing::{debug, info};

use crate::clients::dav_xml::{
    CALENDAR_HOME_SET_BODY, CALENDAR_LIST_BODY, CURRENT_USER_PRINCIPAL_BODY, calendar_query_body,
    parse_multistatus,
};
use crate::config::CalendarAccount;
use crate::error::BotError;
use crate::service::agenda_service::{CalendarRef, CalendarSource};

/// Read-only CalDAV access with basic auth (iCloud app-specific passwords work here).
pub struct CalDavClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl CalDavClient {
    pub fn new(http: reqwest::Client, account: &CalendarAccount) -> Result<Self, BotError> {
        let base_url = Url::parse(&account.url)
            .map_err(|e| BotError::Config(format!("invalid CALDAV_URL {}: {}", account.url, e)))?;
        Ok(Self {
            http,
            base_url,
            username: account.username.clone(),
            password: account.password.clone(),
        })
    }

    async fn send(&self, method: &str, url: &Url, depth: &str, body: String) -> Result<String, BotError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| BotError::Config(format!("invalid DAV method {}: {}", method, e)))?;
        debug!(method = %method, url = %url, "dav request");
        let response = self
            .http
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header("Depth", depth)
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BotError::from_status(status, &text));
        }
        Ok(text)
    }

    pub async fn principal(&self) -> Result<Url, BotError> {
        let body = self
            .send("PROPFIND", &self.base_url, "0", CURRENT_USER_PRINCIPAL_BODY.to_string())
            .await?;
        let href = parse_multistatus(&body)?
            .into_iter()
            .find_map(|r| r.current_user_principal)
            .ok_or_else(|| BotError::NotFound("current-user-principal".to_string()))?;
        resolve(&self.base_url, &href)
    }

    pub async fn calendar_home(&self, principal: &Url) -> Result<Url, BotError> {
        let body = self
            .send("PROPFIND", principal, "0", CALENDAR_HOME_SET_BODY.to_string())
            .await?;
        let href = parse_multistatus(&body)?
            .into_iter()
            .find_map(|r| r.calendar_home_set)
            .ok_or_else(|| BotError::NotFound("calendar-home-set".to_string()))?;
        resolve(principal, &href)
    }

    pub async fn list_calendars(&self) -> Result<Vec<CalendarRef>, BotError> {
        let principal = self.principal().await?;
        let home = self.calendar_home(&principal).await?;
        let body = self
            .send("PROPFIND", &home, "1", CALENDAR_LIST_BODY.to_string())
            .await?;

        let mut calendars = Vec::new();
        for response in parse_multistatus(&body)?.into_iter().filter(|r| r.holds_events()) {
            let url = resolve(&home, &response.href)?;
            let name = response
                .display_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| url.path().to_string());
            calendars.push(CalendarRef {
                name,
                url: url.to_string(),
            });
        }
        info!(count = calendars.len(), "discovered calendars");
        Ok(calendars)
    }

    pub async fn query_events(
        &self,
        calendar: &CalendarRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, BotError> {
        let url = Url::parse(&calendar.url)
            .map_err(|e| BotError::MalformedResponse(format!("calendar url {}: {}", calendar.url, e)))?;
        let body = self
            .send("REPORT", &url, "1", calendar_query_body(start, end))
            .await?;
        Ok(parse_multistatus(&body)?
            .into_iter()
            .filter_map(|r| r.calendar_data)
            .collect())
    }
}

#[async_trait]
impl CalendarSource for CalDavClient {
    async fn calendars(&self) -> Result<Vec<CalendarRef>, BotError> {
        self.list_calendars().await
    }

    async fn events_between(
        &self,
        calendar: &CalendarRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, BotError> {
        self.query_events(calendar, start, end).await
    }
}

fn resolve(base: &Url, href: &str) -> Result<Url, BotError> {
    base.join(href)
        .map_err(|e| BotError::MalformedResponse(format!("bad href {}: {}", href, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_hrefs() {
        let base = Url::parse("https://caldav.icloud.com").unwrap();
        assert_eq!(
            resolve(&base, "/123/principal/").unwrap().as_str(),
            "https://caldav.icloud.com/123/principal/"
        );
        assert_eq!(
            resolve(&base, "https://p42-caldav.icloud.com:443/123/calendars/")
                .unwrap()
                .as_str(),
            "https://p42-caldav.icloud.com/123/calendars/"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let account = CalendarAccount {
            url: "not a url".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
        };
        assert!(matches!(
            CalDavClient::new(reqwest::Client::new(), &account),
            Err(BotError::Config(_))
        ));
    }
}
