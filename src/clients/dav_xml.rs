//! WebDAV/CalDAV request bodies and multistatus parsing.

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

use crate::error::BotError;

const DAV_NS: &str = "DAV:";
const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";
const RANGE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub const CURRENT_USER_PRINCIPAL_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop><d:current-user-principal/></d:prop>
</d:propfind>"#;

pub const CALENDAR_HOME_SET_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop><c:calendar-home-set/></d:prop>
</d:propfind>"#;

pub const CALENDAR_LIST_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:resourcetype/>
    <d:displayname/>
    <c:supported-calendar-component-set/>
  </d:prop>
</d:propfind>"#;

/// `calendar-query` REPORT for VEVENTs in `[start, end)`, asking the server to
/// expand recurrences inside the range.
pub fn calendar_query_body(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let start = start.format(RANGE_FORMAT);
    let end = end.format(RANGE_FORMAT);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:getetag/>
    <c:calendar-data><c:expand start="{start}" end="{end}"/></c:calendar-data>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT">
        <c:time-range start="{start}" end="{end}"/>
      </c:comp-filter>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#
    )
}

/// The successful (`200`) properties of one `<d:response>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DavResponse {
    pub href: String,
    pub display_name: Option<String>,
    pub is_calendar: bool,
    /// Empty when the server did not report a component set.
    pub components: Vec<String>,
    pub current_user_principal: Option<String>,
    pub calendar_home_set: Option<String>,
    pub calendar_data: Option<String>,
}

impl DavResponse {
    pub fn holds_events(&self) -> bool {
        self.is_calendar
            && (self.components.is_empty()
                || self.components.iter().any(|c| c.eq_ignore_ascii_case("VEVENT")))
    }
}

pub fn parse_multistatus(xml: &str) -> Result<Vec<DavResponse>, BotError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if !root.has_tag_name((DAV_NS, "multistatus")) {
        return Err(BotError::MalformedResponse(format!(
            "expected multistatus, got <{}>",
            root.tag_name().name()
        )));
    }

    let mut responses = Vec::new();
    for response in root.children().filter(|n| n.has_tag_name((DAV_NS, "response"))) {
        let Some(href) = child(response, DAV_NS, "href").and_then(|n| n.text()) else {
            continue;
        };
        let mut parsed = DavResponse {
            href: href.trim().to_string(),
            ..DavResponse::default()
        };

        let ok_props = response
            .children()
            .filter(|n| n.has_tag_name((DAV_NS, "propstat")))
            .filter(|propstat| {
                child(*propstat, DAV_NS, "status")
                    .and_then(|n| n.text())
                    .is_none_or(|status| status.contains(" 200 "))
            })
            .filter_map(|propstat| child(propstat, DAV_NS, "prop"));

        for prop in ok_props {
            if let Some(name) = child(prop, DAV_NS, "displayname").and_then(|n| n.text()) {
                parsed.display_name = Some(name.trim().to_string());
            }
            if let Some(kind) = child(prop, DAV_NS, "resourcetype") {
                parsed.is_calendar = child(kind, CALDAV_NS, "calendar").is_some();
            }
            if let Some(set) = child(prop, CALDAV_NS, "supported-calendar-component-set") {
                parsed.components = set
                    .children()
                    .filter(|n| n.has_tag_name((CALDAV_NS, "comp")))
                    .filter_map(|n| n.attribute("name"))
                    .map(str::to_string)
                    .collect();
            }
            if let Some(principal) = child(prop, DAV_NS, "current-user-principal") {
                parsed.current_user_principal = nested_href(principal);
            }
            if let Some(home) = child(prop, CALDAV_NS, "calendar-home-set") {
                parsed.calendar_home_set = nested_href(home);
            }
            if let Some(data) = child(prop, CALDAV_NS, "calendar-data").and_then(|n| n.text()) {
                parsed.calendar_data = Some(data.to_string());
            }
        }
        responses.push(parsed);
    }
    Ok(responses)
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((ns, name)))
}

fn nested_href(node: Node) -> Option<String> {
    child(node, DAV_NS, "href")
        .and_then(|n| n.text())
        .map(|href| href.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reads_principal_and_home_set() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<multistatus xmlns="DAV:">
  <response>
    <href>/</href>
    <propstat>
      <prop><current-user-principal><href>/123456/principal/</href></current-user-principal></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;
        let responses = parse_multistatus(xml).unwrap();
        assert_eq!(
            responses[0].current_user_principal.as_deref(),
            Some("/123456/principal/")
        );

        let xml = r#"<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/123456/principal/</d:href>
    <d:propstat>
      <d:prop><cal:calendar-home-set><d:href>https://p42-caldav.icloud.com:443/123456/calendars/</d:href></cal:calendar-home-set></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;
        let responses = parse_multistatus(xml).unwrap();
        assert_eq!(
            responses[0].calendar_home_set.as_deref(),
            Some("https://p42-caldav.icloud.com:443/123456/calendars/")
        );
    }

    #[test]
    fn lists_event_calendars_only() {
        let xml = r#"<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/123/calendars/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/home/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
        <d:displayname>Privat</d:displayname>
        <c:supported-calendar-component-set><c:comp name="VEVENT"/></c:supported-calendar-component-set>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/tasks/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
        <d:displayname>Erinnerungen</d:displayname>
        <c:supported-calendar-component-set><c:comp name="VTODO"/></c:supported-calendar-component-set>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
    <d:propstat>
      <d:prop><d:getctag/></d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;
        let responses = parse_multistatus(xml).unwrap();
        assert_eq!(responses.len(), 3);
        let calendars: Vec<&DavResponse> = responses.iter().filter(|r| r.holds_events()).collect();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].display_name.as_deref(), Some("Privat"));
        assert_eq!(calendars[0].href, "/123/calendars/home/");
    }

    #[test]
    fn reads_calendar_data_from_cdata() {
        let xml = "<d:multistatus xmlns:d=\"DAV:\" xmlns:c=\"urn:ietf:params:xml:ns:caldav\">\
  <d:response><d:href>/cal/home/e1.ics</d:href>\
    <d:propstat><d:prop><d:getetag>\"1\"</d:getetag>\
      <c:calendar-data><![CDATA[BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n]]></c:calendar-data>\
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>\
  </d:response></d:multistatus>";
        let responses = parse_multistatus(xml).unwrap();
        let data = responses[0].calendar_data.as_deref().unwrap();
        assert!(data.starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn rejects_non_multistatus_documents() {
        assert!(parse_multistatus("<error xmlns=\"DAV:\"/>").is_err());
        assert!(parse_multistatus("not xml at all").is_err());
    }

    #[test]
    fn query_body_uses_utc_range() {
        let start = Utc.with_ymd_and_hms(2026, 10, 18, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap();
        let body = calendar_query_body(start, end);
        assert!(body.contains(r#"start="20261018T220000Z""#));
        assert!(body.contains(r#"end="20261019T220000Z""#));
        assert!(body.contains(r#"<c:comp-filter name="VEVENT">"#));
    }
}
