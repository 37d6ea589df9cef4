//! Public store profile: the contact card behind a shared link

use crate::store::{StoreFields, StoreRecord};

pub const WHATSAPP_PREFIX: &str = "https://wa.me/";

/// Shareable link for a store, as programmed into QR codes and NFC tags
pub fn direct_link(origin: &str, id: &str) -> String {
    format!("{}/store/{}", origin.trim_end_matches('/'), id)
}

pub fn tel_link(phone: &str) -> String {
    format!("tel:{}", phone)
}

/// The WhatsApp value is appended as stored, without any normalization
pub fn whatsapp_link(whatsapp: &str) -> String {
    format!("{}{}", WHATSAPP_PREFIX, whatsapp)
}

pub fn mailto_link(email: &str) -> String {
    format!("mailto:{}", email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Call,
    WhatsApp,
    Email,
    Website,
    Facebook,
    Instagram,
    Telegram,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::Call => "Call",
            Channel::WhatsApp => "WhatsApp",
            Channel::Email => "Email",
            Channel::Website => "Website",
            Channel::Facebook => "Facebook",
            Channel::Instagram => "Instagram",
            Channel::Telegram => "Telegram",
        }
    }

    /// Same-tab channels hand off to the phone's dialer or mail client
    pub fn opens_new_tab(self) -> bool {
        !matches!(self, Channel::Call | Channel::Email)
    }

    /// CSS modifier used by the profile template
    pub fn css_class(self) -> &'static str {
        match self {
            Channel::Call => "call",
            Channel::WhatsApp => "whatsapp",
            Channel::Email => "email",
            Channel::Website => "website",
            Channel::Facebook => "facebook",
            Channel::Instagram => "instagram",
            Channel::Telegram => "telegram",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    pub channel: Channel,
    pub label: &'static str,
    pub href: String,
    pub new_tab: bool,
}

impl ContactLink {
    fn new(channel: Channel, href: String) -> Self {
        Self {
            channel,
            label: channel.label(),
            href,
            new_tab: channel.opens_new_tab(),
        }
    }
}

/// Everything the public page shows, with absent sections already dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    /// Call, WhatsApp, Email, Website, in that order
    pub contact_actions: Vec<ContactLink>,
    /// Facebook, Instagram, Telegram, in that order
    pub social_links: Vec<ContactLink>,
    pub address: Option<String>,
    pub map_url: Option<String>,
    pub review_url: Option<String>,
}

fn present(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn present_opt(value: &Option<String>) -> Option<&str> {
    value.as_deref().and_then(present)
}

impl From<&StoreFields> for ProfileView {
    fn from(store: &StoreFields) -> Self {
        let contact_actions: Vec<ContactLink> = [
            present_opt(&store.phone).map(|v| ContactLink::new(Channel::Call, tel_link(v))),
            present_opt(&store.whatsapp)
                .map(|v| ContactLink::new(Channel::WhatsApp, whatsapp_link(v))),
            present_opt(&store.email).map(|v| ContactLink::new(Channel::Email, mailto_link(v))),
            present_opt(&store.website_url)
                .map(|v| ContactLink::new(Channel::Website, v.to_string())),
        ]
        .into_iter()
        .flatten()
        .collect();

        let social_links: Vec<ContactLink> = [
            (Channel::Facebook, &store.facebook),
            (Channel::Instagram, &store.instagram),
            (Channel::Telegram, &store.telegram),
        ]
        .into_iter()
        .filter_map(|(channel, value)| {
            present_opt(value).map(|v| ContactLink::new(channel, v.to_string()))
        })
        .collect();

        Self {
            name: store.name.clone(),
            logo_url: present_opt(&store.logo_url).map(str::to_string),
            description: present(&store.description).map(str::to_string),
            opening_hours: present(&store.opening_hours).map(str::to_string),
            contact_actions,
            social_links,
            address: present(&store.address).map(str::to_string),
            map_url: present(&store.location_url).map(str::to_string),
            review_url: present_opt(&store.google_review_url).map(str::to_string),
        }
    }
}

impl From<&StoreRecord> for ProfileView {
    fn from(record: &StoreRecord) -> Self {
        Self::from(&record.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(links: &[ContactLink]) -> Vec<Channel> {
        links.iter().map(|link| link.channel).collect()
    }

    #[test]
    fn test_name_and_phone_only_renders_single_call_action() {
        let fields = StoreFields {
            phone: Some("5551112222".to_string()),
            ..StoreFields::named("Joe's Cafe")
        };

        let view = ProfileView::from(&fields);

        assert_eq!(view.name, "Joe's Cafe");
        assert_eq!(channels(&view.contact_actions), [Channel::Call]);
        assert_eq!(view.contact_actions[0].href, "tel:5551112222");
        assert!(!view.contact_actions[0].new_tab);
        assert!(view.social_links.is_empty());
        assert_eq!(view.map_url, None);
        assert_eq!(view.review_url, None);
        assert_eq!(view.address, None);
    }

    #[test]
    fn test_whatsapp_link_is_verbatim() {
        assert_eq!(whatsapp_link("15551234567"), "https://wa.me/15551234567");
        assert_eq!(whatsapp_link("+1 (555) 123"), "https://wa.me/+1 (555) 123");
    }

    #[test]
    fn test_full_record_orders_every_channel() {
        let fields = StoreFields {
            name: "Harbor Books".to_string(),
            logo_url: Some("https://cdn.example.com/logo.png".to_string()),
            description: "Used books".to_string(),
            opening_hours: "Mon-Sat 9-18".to_string(),
            website_url: Some("https://harbor.example.com".to_string()),
            whatsapp: Some("15551234567".to_string()),
            address: "1 Pier Rd".to_string(),
            phone: Some("5550001111".to_string()),
            email: Some("hi@harbor.example.com".to_string()),
            location_url: "https://maps.example.com/?q=harbor".to_string(),
            facebook: Some("https://facebook.com/harbor".to_string()),
            instagram: Some("https://instagram.com/harbor".to_string()),
            telegram: Some("https://t.me/harbor".to_string()),
            google_review_url: Some("https://g.page/r/harbor/review".to_string()),
        };

        let view = ProfileView::from(&fields);

        assert_eq!(
            channels(&view.contact_actions),
            [
                Channel::Call,
                Channel::WhatsApp,
                Channel::Email,
                Channel::Website
            ]
        );
        assert_eq!(
            channels(&view.social_links),
            [Channel::Facebook, Channel::Instagram, Channel::Telegram]
        );
        assert_eq!(view.contact_actions[1].href, "https://wa.me/15551234567");
        assert_eq!(view.contact_actions[2].href, "mailto:hi@harbor.example.com");
        assert_eq!(view.contact_actions[3].href, "https://harbor.example.com");
        assert!(view.social_links.iter().all(|link| link.new_tab));
        assert_eq!(view.review_url.as_deref(), Some("https://g.page/r/harbor/review"));
        assert_eq!(view.opening_hours.as_deref(), Some("Mon-Sat 9-18"));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let fields = StoreFields {
            whatsapp: Some(String::new()),
            email: Some(String::new()),
            logo_url: Some(String::new()),
            ..StoreFields::named("Blank")
        };

        let view = ProfileView::from(&fields);

        assert!(view.contact_actions.is_empty());
        assert_eq!(view.logo_url, None);
    }

    #[test]
    fn test_direct_link() {
        assert_eq!(
            direct_link("https://links.example.com/", "abc"),
            "https://links.example.com/store/abc"
        );
    }
}
