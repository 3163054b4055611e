use std::fmt::Display;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::encoding::Document;
use crate::protocol::transport::{HttpsTransport, Transport};
use crate::protocol::value::{Fields, Resource, Value};
use crate::protocol::Protocol;

/// One method per API endpoint.
pub struct Spreedly<T = HttpsTransport> {
    protocol: Protocol<T>,
    allow_destructive_operations: bool,
}

impl Spreedly<HttpsTransport> {
    pub fn new(config: &Config) -> Spreedly<HttpsTransport> {
        Spreedly::with_transport(config, HttpsTransport::new())
    }
}

impl<T: Transport> Spreedly<T> {
    pub fn with_transport(config: &Config, transport: T) -> Spreedly<T> {
        Spreedly {
            protocol: Protocol::with_transport(config, transport),
            allow_destructive_operations: config.allow_destructive_operations,
        }
    }

    pub fn protocol(&self) -> &Protocol<T> {
        &self.protocol
    }

    pub fn get_plans(&self) -> Result<Vec<Value>> {
        trace!("get_plans");

        self.protocol.get("subscription_plans.xml")?.into_array()
    }

    /// Creates a subscriber. `customer_id` overrides any `customer_id` in `fields`.
    pub fn create_subscriber<I: Display>(&self, customer_id: I, fields: Fields) -> Result<Resource> {
        trace!("create_subscriber - customer_id: {} - fields: {:?}", customer_id, fields);

        let mut fields = fields;
        fields.insert("customer_id", customer_id.to_string());
        let data = self.protocol.create_document(&Document::with_fields("subscriber", fields))?;

        self.protocol.post("subscribers.xml", &data)?.into_resource()
    }

    pub fn get_subscriber<I: Display>(&self, subscriber_id: I) -> Result<Resource> {
        trace!("get_subscriber - subscriber_id: {}", subscriber_id);

        let url = format!("subscribers/{}.xml", subscriber_id);
        self.protocol.get(&url)?.into_resource()
    }

    pub fn update_subscriber<I: Display>(&self, subscriber_id: I, fields: Fields) -> Result<()> {
        trace!("update_subscriber - subscriber_id: {} - fields: {:?}", subscriber_id, fields);

        let url = format!("subscribers/{}.xml", subscriber_id);
        let data = self.protocol.create_document(&Document::with_fields("subscriber", fields))?;

        self.protocol.put(&url, &data)?;
        Ok(())
    }

    pub fn subscribe_to_trial<I: Display>(&self, subscriber_id: I, plan_id: i64) -> Result<Resource> {
        trace!("subscribe_to_trial - subscriber_id: {} - plan_id: {}", subscriber_id, plan_id);

        let document = Document::new("subscription-plan").field("id", plan_id);
        let data = self.protocol.create_document(&document)?;
        let url = format!("subscribers/{}/subscribe_to_free_trial.xml", subscriber_id);

        self.protocol.post(&url, &data)?.into_resource()
    }

    /// Gives the subscriber a complimentary lifetime subscription at `feature_level`.
    pub fn subscribe_to_lifetime_plan<I: Display>(
        &self,
        subscriber_id: I,
        feature_level: &str,
    ) -> Result<Resource> {
        trace!(
            "subscribe_to_lifetime_plan - subscriber_id: {} - feature_level: {:?}",
            subscriber_id,
            feature_level
        );

        let document = Document::new("lifetime-complimentary-subscription")
            .field("feature_level", feature_level);
        let data = self.protocol.create_document(&document)?;
        let url = format!("subscribers/{}/lifetime_complimentary_subscriptions.xml", subscriber_id);

        self.protocol.post(&url, &data)?.into_resource()
    }

    /// Makes the subscriber eligible for a free trial again.
    pub fn allow_another_trial<I: Display>(&self, subscriber_id: I) -> Result<Resource> {
        trace!("allow_another_trial - subscriber_id: {}", subscriber_id);

        let url = format!("subscribers/{}/allow_free_trial.xml", subscriber_id);
        self.protocol.post(&url, b"")?.into_resource()
    }

    /// Deletes one subscriber. Does nothing unless destructive operations are allowed.
    pub fn delete_subscriber<I: Display>(&self, subscriber_id: I) -> Result<()> {
        trace!("delete_subscriber - subscriber_id: {}", subscriber_id);

        if !self.destructive_allowed("delete_subscriber") {
            return Ok(());
        }

        self.protocol.delete(&format!("subscribers/{}.xml", subscriber_id))?;
        Ok(())
    }

    /// Removes every subscriber of the site. Does nothing unless destructive
    /// operations are allowed; never enable them against a production site.
    pub fn delete_all_subscribers(&self) -> Result<()> {
        trace!("delete_all_subscribers");

        if !self.destructive_allowed("delete_all_subscribers") {
            return Ok(());
        }

        self.protocol.delete("subscribers.xml")?;
        Ok(())
    }

    fn destructive_allowed(&self, operation: &str) -> bool {
        if !self.allow_destructive_operations {
            warn!(
                "{} skipped: destructive operations are disabled for {}",
                operation,
                self.protocol.base_path()
            );
        }
        self.allow_destructive_operations
    }
}

#[cfg(test)]
mod tests {
    use super::Spreedly;
    use crate::config::Config;
    use crate::error::Error;
    use crate::protocol::tests::RecordingTransport;
    use crate::protocol::transport::Method;
    use crate::protocol::value::Fields;

    const BASE: &'static str = "https://spreedly.com/api/v4/pingbrigadetest";

    const SUBSCRIBER: &'static str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<subscriber>
  <active type=\"boolean\">false</active>
  <billing-first-name>First</billing-first-name>
  <customer-id>1</customer-id>
  <eligible-for-free-trial type=\"boolean\">true</eligible-for-free-trial>
  <email></email>
  <grace-until type=\"datetime\"></grace-until>
  <on-trial type=\"boolean\">true</on-trial>
  <screen-name>test</screen-name>
  <store-credit type=\"decimal\">0.0</store-credit>
</subscriber>";

    const PLANS: &'static str = "<subscription-plans type=\"array\">
  <subscription-plan>
    <amount type=\"decimal\">9.00</amount>
    <id type=\"integer\">10399</id>
    <name>Basic</name>
  </subscription-plan>
</subscription-plans>";

    fn config() -> Config {
        Config::new("a9e3cfde", "pingbrigadetest")
    }

    fn body(transport: &RecordingTransport) -> String {
        String::from_utf8(transport.last_request().body).unwrap()
    }

    #[test]
    fn test_get_plans() {
        let transport = RecordingTransport::new().respond(200, PLANS);
        let client = Spreedly::with_transport(&config(), &transport);

        let plans = client.get_plans().unwrap();

        assert_eq!(1, plans.len());
        assert_eq!(Some(10399), plans[0]["id"].as_integer());
        assert_eq!(Some("Basic"), plans[0]["name"].as_str());
        assert_eq!(format!("{}/subscription_plans.xml", BASE), transport.last_request().url);
    }

    #[test]
    fn test_get_plans_requires_array() {
        let transport = RecordingTransport::new().respond(200, "<subscription-plan/>");
        let client = Spreedly::with_transport(&config(), &transport);

        match client.get_plans() {
            Err(Error::UnexpectedDocument { .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_create_subscriber() {
        let transport = RecordingTransport::new().respond(201, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        let fields = Fields::new()
            .with("screen_name", "test")
            .with("billing_first_name", "First");
        let subscriber = client.create_subscriber(1, fields).unwrap();

        let request = transport.last_request();
        assert_eq!(Method::Post, request.method);
        assert_eq!(format!("{}/subscribers.xml", BASE), request.url);
        assert_eq!(
            "<subscriber><screen-name>test</screen-name>\
             <billing-first-name>First</billing-first-name>\
             <customer-id>1</customer-id></subscriber>",
            body(&transport)
        );

        assert_eq!(Some("test"), subscriber["screen_name"].as_str());
        assert_eq!(Some("First"), subscriber["billing_first_name"].as_str());
        assert_eq!(Some(""), subscriber["email"].as_str());
        assert!(subscriber["grace_until"].is_null());
    }

    #[test]
    fn test_create_subscriber_overrides_customer_id_field() {
        let transport = RecordingTransport::new().respond(201, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        client.create_subscriber("42", Fields::new().with("customer_id", 7)).unwrap();

        assert_eq!("<subscriber><customer-id>42</customer-id></subscriber>", body(&transport));
    }

    #[test]
    fn test_create_subscriber_validation_error() {
        let transport = RecordingTransport::new().respond(422, "Validation failed");
        let client = Spreedly::with_transport(&config(), &transport);

        let err = client.create_subscriber(1, Fields::new()).unwrap_err();

        assert_eq!(Some(422), err.status());
        assert_eq!("422, Validation failed", err.to_string());
    }

    #[test]
    fn test_get_subscriber() {
        let transport = RecordingTransport::new().respond(200, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        let subscriber = client.get_subscriber(1).unwrap();

        let request = transport.last_request();
        assert_eq!(Method::Get, request.method);
        assert_eq!(format!("{}/subscribers/1.xml", BASE), request.url);
        assert_eq!(Some(false), subscriber["active"].as_bool());
    }

    #[test]
    fn test_update_subscriber() {
        let transport = RecordingTransport::new().respond(200, "");
        let client = Spreedly::with_transport(&config(), &transport);

        let fields = Fields::new()
            .with("email", "jack@bauer.com")
            .with("screen_name", "jb");
        client.update_subscriber(1, fields).unwrap();

        let request = transport.last_request();
        assert_eq!(Method::Put, request.method);
        assert_eq!(format!("{}/subscribers/1.xml", BASE), request.url);
        assert_eq!(
            "<subscriber><email>jack@bauer.com</email><screen-name>jb</screen-name></subscriber>",
            body(&transport)
        );
    }

    #[test]
    fn test_subscribe_to_trial() {
        let transport = RecordingTransport::new().respond(200, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        let subscription = client.subscribe_to_trial(1, 10399).unwrap();

        let request = transport.last_request();
        assert_eq!(format!("{}/subscribers/1/subscribe_to_free_trial.xml", BASE), request.url);
        assert_eq!("<subscription-plan><id>10399</id></subscription-plan>", body(&transport));
        assert_eq!(Some(true), subscription["on_trial"].as_bool());
    }

    #[test]
    fn test_subscribe_to_lifetime_plan() {
        let transport = RecordingTransport::new().respond(200, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        client.subscribe_to_lifetime_plan(1, "free").unwrap();

        let request = transport.last_request();
        assert_eq!(
            format!("{}/subscribers/1/lifetime_complimentary_subscriptions.xml", BASE),
            request.url
        );
        assert_eq!(
            "<lifetime-complimentary-subscription><feature-level>free</feature-level>\
             </lifetime-complimentary-subscription>",
            body(&transport)
        );
    }

    #[test]
    fn test_allow_another_trial() {
        let transport = RecordingTransport::new().respond(200, SUBSCRIBER);
        let client = Spreedly::with_transport(&config(), &transport);

        let subscriber = client.allow_another_trial(1).unwrap();

        let request = transport.last_request();
        assert_eq!(Method::Post, request.method);
        assert_eq!(format!("{}/subscribers/1/allow_free_trial.xml", BASE), request.url);
        assert!(request.body.is_empty());
        assert_eq!(Some(true), subscriber["eligible_for_free_trial"].as_bool());
    }

    #[test]
    fn test_delete_refused_by_default() {
        let transport = RecordingTransport::new();
        let config = Config::new("a9e3cfde", "production");
        let client = Spreedly::with_transport(&config, &transport);

        client.delete_subscriber(1).unwrap();
        client.delete_all_subscribers().unwrap();

        assert_eq!(0, transport.request_count());
    }

    #[test]
    fn test_delete_ignores_site_name() {
        // A "test" site name alone does not unlock deletion
        let transport = RecordingTransport::new();
        let client = Spreedly::with_transport(&config(), &transport);

        client.delete_all_subscribers().unwrap();

        assert_eq!(0, transport.request_count());
    }

    #[test]
    fn test_delete_when_allowed() {
        let transport = RecordingTransport::new();
        let config = config().with_destructive_operations(true);
        let client = Spreedly::with_transport(&config, &transport);

        client.delete_subscriber(1).unwrap();
        let request = transport.last_request();
        assert_eq!(Method::Delete, request.method);
        assert_eq!(format!("{}/subscribers/1.xml", BASE), request.url);

        client.delete_all_subscribers().unwrap();
        assert_eq!(format!("{}/subscribers.xml", BASE), transport.last_request().url);
        assert_eq!(2, transport.request_count());
    }

    #[test]
    fn test_delete_not_found() {
        let transport = RecordingTransport::new().respond(404, "Not found");
        let config = config().with_destructive_operations(true);
        let client = Spreedly::with_transport(&config, &transport);

        assert_eq!(Some(404), client.delete_subscriber(99).unwrap_err().status());
    }
}
