//! Shared fixtures for executor and dispatcher tests

use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::JoinHandle;

use crate::actions::ActionExecutor;
use crate::bridge::{BackgroundService, ChannelBridge, MemoryTabs, TabId, TabInfo};
use crate::config::{EngineSettings, StaticConfigLoader};
use crate::dispatch::Dispatcher;
use crate::notify::RecordingNotifier;
use crate::page::{MemoryClipboard, MemoryDocument, RecordingNavigator, RecordingRunner};
use crate::state::{MemoryStorage, RunState};

/// An in-memory page with every port recorded, plus a running background service
pub struct PageHarness {
    url: String,
    html: String,
    pub document: Rc<MemoryDocument>,
    pub clipboard: Rc<MemoryClipboard>,
    pub navigator: Rc<RecordingNavigator>,
    pub runner: Rc<RecordingRunner>,
    pub notifier: Rc<RecordingNotifier>,
    pub storage: Rc<MemoryStorage>,
    bridge: RefCell<ChannelBridge>,
    background: RefCell<Option<JoinHandle<MemoryTabs>>>,
}

impl PageHarness {
    pub const TAB_ID: TabId = 7;

    /// Must be called inside a tokio runtime (spawns the background service)
    pub fn new(url: &str, html: &str) -> Self {
        let clipboard = Rc::new(MemoryClipboard::new());
        let document = Rc::new(MemoryDocument::new(url, html).with_clipboard(clipboard.clone()));

        let (bridge, rx) = ChannelBridge::channel(Some(Self::TAB_ID));
        let tabs = MemoryTabs::new().open(TabInfo::new(Self::TAB_ID, url));
        let background = tokio::spawn(BackgroundService::new(tabs).run(rx));

        Self {
            url: url.to_string(),
            html: html.to_string(),
            document,
            clipboard,
            navigator: Rc::new(RecordingNavigator::new()),
            runner: Rc::new(RecordingRunner::new()),
            notifier: Rc::new(RecordingNotifier::new()),
            storage: Rc::new(MemoryStorage::new()),
            bridge: RefCell::new(bridge),
            background: RefCell::new(Some(background)),
        }
    }

    /// Same page, but clipboard writes must go through the scratch-node fallback
    pub fn without_clipboard_api(mut self) -> Self {
        let clipboard = Rc::new(MemoryClipboard::new().without_direct_access());
        self.document = Rc::new(
            MemoryDocument::new(&self.url, &self.html).with_clipboard(clipboard.clone()),
        );
        self.clipboard = clipboard;
        self
    }

    pub fn executor(&self) -> ActionExecutor {
        ActionExecutor::new(
            self.document.clone(),
            self.clipboard.clone(),
            self.navigator.clone(),
            self.runner.clone(),
            Rc::new(self.bridge.borrow().clone()),
        )
    }

    pub fn dispatcher(&self, mappings: &str, settings: EngineSettings) -> Dispatcher {
        let run_state = RunState::new(self.storage.clone(), settings.restore_ordering);
        Dispatcher::new(
            Rc::new(StaticConfigLoader::new(mappings)),
            run_state,
            self.executor(),
            self.notifier.clone(),
            settings,
        )
    }

    /// Stop the background service and return its tab list. Later bridge
    /// requests fail as disconnected.
    pub async fn shutdown_background(&self) -> MemoryTabs {
        let (disconnected, _) = ChannelBridge::channel(Some(Self::TAB_ID));
        drop(self.bridge.replace(disconnected));

        let handle = self.background.borrow_mut().take();
        match handle {
            Some(handle) => handle.await.expect("background service panicked"),
            None => panic!("background service already shut down"),
        }
    }
}
