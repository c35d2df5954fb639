//! Binds the marketplace page's buttons to wallet actions.

use alloy::primitives::B256;
use minty_wallet_adapters::WalletAdapterConfig;
use minty_wallet_core::{ControlPort, ControlView, TxIntent};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement, HtmlInputElement};

use crate::bridge::WalletBridge;

/// A page button driven through an action's lifecycle.
pub struct DomControl {
    button: HtmlButtonElement,
    /// Write the explorer link into the card footer once the tx is sent.
    explorer_link: bool,
}

impl DomControl {
    fn new(button: HtmlButtonElement) -> Self {
        Self {
            button,
            explorer_link: false,
        }
    }
}

impl ControlPort for DomControl {
    fn render(&self, view: &ControlView) {
        self.button.set_text_content(Some(&view.label));
        self.button.set_disabled(view.disabled);
        let _ = self
            .button
            .set_attribute("aria-busy", if view.busy { "true" } else { "false" });
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn transaction_sent(&self, _tx_hash: B256, explorer_url: Option<&str>) {
        if let (true, Some(url)) = (self.explorer_link, explorer_url) {
            set_explorer_link(url);
        }
    }
}

enum Click {
    Connect(HtmlButtonElement),
    Disconnect(HtmlButtonElement),
    Approve(HtmlButtonElement),
    List(HtmlButtonElement),
    Unlist(HtmlButtonElement),
    AcceptProposal(HtmlButtonElement),
}

impl Click {
    fn from_target(target: &Element) -> Option<Self> {
        let find = |selector: &str| {
            target
                .closest(selector)
                .ok()
                .flatten()
                .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
        };
        if let Some(button) = find("#walletConnectBtn") {
            return Some(Self::Connect(button));
        }
        if let Some(button) = find("#walletDisconnectBtn") {
            return Some(Self::Disconnect(button));
        }
        if let Some(button) = find("#approve") {
            return Some(Self::Approve(button));
        }
        if let Some(button) = find("#listButton") {
            return Some(Self::List(button));
        }
        if let Some(button) = find(".unlistBtn") {
            return Some(Self::Unlist(button));
        }
        find(".acceptProposal").map(Self::AcceptProposal)
    }

    async fn run(self, bridge: WalletBridge) {
        match self {
            Self::Connect(button) => {
                if bridge.connect(&DomControl::new(button)).await.is_ok() {
                    reload();
                }
            }
            Self::Disconnect(button) => {
                if bridge.disconnect(&DomControl::new(button)).await.is_ok() {
                    reload();
                }
            }
            Self::Approve(button) => {
                let intent = TxIntent::approve(text_of("address"), text_of("id"));
                let control = DomControl {
                    button,
                    explorer_link: true,
                };
                if bridge.submit(&intent, &control).await.is_ok() {
                    show_list_button();
                }
            }
            Self::List(button) => {
                let intent = TxIntent::list(text_of("address"), text_of("id"), price_input());
                let _ = bridge.submit(&intent, &DomControl::new(button)).await;
            }
            Self::Unlist(button) => {
                let intent = TxIntent::unlist(
                    data_attr(&button, "data-contract"),
                    data_attr(&button, "data-tokenid"),
                );
                if bridge.submit(&intent, &DomControl::new(button)).await.is_ok() {
                    reload();
                }
            }
            Self::AcceptProposal(button) => {
                let intent = TxIntent::accept_proposal(
                    data_attr(&button, "data-contract"),
                    data_attr(&button, "data-tokenid"),
                    data_attr(&button, "data-buyer"),
                );
                let _ = bridge.submit(&intent, &DomControl::new(button)).await;
            }
        }
    }
}

pub fn install() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("missing window")?;
    let document = window.document().ok_or("missing document")?;
    let config = WalletAdapterConfig {
        backend_base_url: window.location().origin()?,
        ..WalletAdapterConfig::from_env()
    };
    let bridge =
        WalletBridge::with_config(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    tracing::info!(provider = bridge.provider_mode(), "marketplace controls bound");

    let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if let Some(click) = Click::from_target(&target) {
            event.prevent_default();
            wasm_bindgen_futures::spawn_local(click.run(bridge.clone()));
        }
    });
    document.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    // Lives as long as the page
    handler.forget();
    Ok(())
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn text_of(id: &str) -> String {
    document()
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|el| el.text_content())
        .unwrap_or_default()
}

fn price_input() -> String {
    document()
        .and_then(|d| d.get_element_by_id("nftPrice"))
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

fn data_attr(button: &HtmlButtonElement, name: &str) -> String {
    button.get_attribute(name).unwrap_or_default()
}

fn show_list_button() {
    if let Some(button) = document()
        .and_then(|d| d.get_element_by_id("listButton"))
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let _ = button.style().set_property("display", "block");
    }
}

fn set_explorer_link(url: &str) {
    if let Some(footer) = document().and_then(|d| d.query_selector(".card-footer").ok().flatten()) {
        footer.set_inner_html(&format!(
            "<a href='{url}' target=\"_blank\">View on Explorer</a>"
        ));
    }
}

fn reload() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}
