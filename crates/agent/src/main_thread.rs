// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox carrying requests to the VM main thread.
//!
//! [`MainThreadInterface`] lives on the main thread and owns a table of
//! objects that other threads address by [`ObjectId`]. Other threads hold a
//! [`MainThreadHandle`] and post [`Request`]s that create, call and delete
//! those objects. Posting to an empty queue requests a VM interrupt; the
//! interrupt hook drains the queue.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use insp_adapters::{Environment, Interrupter};
use insp_core::ObjectId;
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::client::InspectorClient;
use crate::session::{CrossThreadInspectorSession, InspectorSessionDelegate};

type Factory = Box<dyn FnOnce(&MainThreadInterface) -> Rc<dyn Any> + Send>;
type Call = Box<dyn FnOnce(&dyn Any) + Send>;

/// Work for the main thread.
pub enum Request {
    /// Build an object and store it under `id`.
    Create { id: ObjectId, factory: Factory },
    /// Run a closure against the object stored under `id`.
    Call { id: ObjectId, call: Call },
    /// Remove the object stored under `id`.
    Delete { id: ObjectId },
}

impl Request {
    fn run(self, thread: &MainThreadInterface) {
        match self {
            Request::Create { id, factory } => {
                let object = factory(thread);
                thread.add_object(id, object);
            }
            Request::Call { id, call } => {
                // The clone keeps the object alive if the call deletes it
                let object = thread.get_object(id);
                call(object.as_ref());
            }
            Request::Delete { id } => thread.remove_object(id),
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Create { id, .. } => write!(f, "Create({id})"),
            Request::Call { id, .. } => write!(f, "Call({id})"),
            Request::Delete { id } => write!(f, "Delete({id})"),
        }
    }
}

/// Thread-safe half of the mailbox.
pub(crate) struct Inbox {
    requests: Mutex<VecDeque<Request>>,
    incoming: Condvar,
    interrupter: Arc<dyn Interrupter>,
}

impl Inbox {
    fn post(&self, request: Request) {
        let mut requests = self.requests.lock();
        let needs_notify = requests.is_empty();
        requests.push_back(request);
        if needs_notify {
            self.interrupter.request_interrupt();
        }
        self.incoming.notify_all();
    }
}

/// Handle other threads use to reach the main thread.
///
/// Goes inert when the [`MainThreadInterface`] is dropped: posts return
/// `false` and the request is discarded on the posting thread.
pub struct MainThreadHandle {
    inbox: Mutex<Option<Arc<Inbox>>>,
    next_object_id: AtomicU32,
}

impl MainThreadHandle {
    fn new(inbox: Arc<Inbox>) -> Self {
        Self {
            inbox: Mutex::new(Some(inbox)),
            next_object_id: AtomicU32::new(1),
        }
    }

    pub fn post(&self, request: Request) -> bool {
        let inbox = self.inbox.lock();
        match inbox.as_ref() {
            Some(inbox) => {
                inbox.post(request);
                true
            }
            None => {
                trace!(?request, "main thread gone, request dropped");
                false
            }
        }
    }

    pub fn expired(&self) -> bool {
        self.inbox.lock().is_none()
    }

    pub fn new_object_id(&self) -> ObjectId {
        ObjectId::new(self.next_object_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Open a frontend session on the main thread's client.
    pub fn connect(
        self: &Arc<Self>,
        delegate: Box<dyn InspectorSessionDelegate + Send>,
        prevent_shutdown: bool,
    ) -> CrossThreadInspectorSession {
        CrossThreadInspectorSession::new(Arc::clone(self), delegate, prevent_shutdown)
    }

    fn reset(&self) {
        *self.inbox.lock() = None;
    }
}

/// Main-thread half of the mailbox, plus the object table.
pub struct MainThreadInterface {
    inbox: Arc<Inbox>,
    handle: Arc<MainThreadHandle>,
    dispatching_queue: RefCell<VecDeque<Request>>,
    dispatching: Cell<bool>,
    managed_objects: RefCell<HashMap<ObjectId, Rc<dyn Any>>>,
    client: Weak<InspectorClient>,
}

impl MainThreadInterface {
    /// Create the interface and hook it into the environment's interrupts.
    pub fn new(env: &dyn Environment, client: Weak<InspectorClient>) -> Rc<Self> {
        let inbox = Arc::new(Inbox {
            requests: Mutex::new(VecDeque::new()),
            incoming: Condvar::new(),
            interrupter: env.interrupter(),
        });
        let thread = Rc::new(Self {
            handle: Arc::new(MainThreadHandle::new(Arc::clone(&inbox))),
            inbox,
            dispatching_queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            managed_objects: RefCell::new(HashMap::new()),
            client,
        });
        let weak = Rc::downgrade(&thread);
        env.add_interrupt_hook(Rc::new(move || {
            if let Some(thread) = weak.upgrade() {
                thread.dispatch_messages();
            }
        }));
        thread
    }

    pub fn handle(&self) -> Arc<MainThreadHandle> {
        Arc::clone(&self.handle)
    }

    pub fn client(&self) -> Weak<InspectorClient> {
        self.client.clone()
    }

    pub fn post(&self, request: Request) {
        self.inbox.post(request);
    }

    /// Drain queued requests, including any posted while draining.
    ///
    /// Re-entrant calls return immediately unless a nested message loop
    /// has released the guard through [`Self::wait_for_frontend_event`].
    pub fn dispatch_messages(&self) {
        if self.dispatching.replace(true) {
            return;
        }
        loop {
            if self.dispatching_queue.borrow().is_empty() {
                let mut requests = self.inbox.requests.lock();
                std::mem::swap(&mut *requests, &mut *self.dispatching_queue.borrow_mut());
            }
            let had_messages = !self.dispatching_queue.borrow().is_empty();
            loop {
                let request = self.dispatching_queue.borrow_mut().pop_front();
                let Some(request) = request else {
                    break;
                };
                request.run(self);
            }
            if !had_messages {
                break;
            }
        }
        self.dispatching.set(false);
    }

    /// Block until a request arrives, for nested message loops.
    pub fn wait_for_frontend_event(&self) {
        self.dispatching.set(false);
        if !self.dispatching_queue.borrow().is_empty() {
            return;
        }
        let mut requests = self.inbox.requests.lock();
        while requests.is_empty() {
            self.inbox.incoming.wait(&mut requests);
        }
    }

    pub fn add_object(&self, id: ObjectId, object: Rc<dyn Any>) {
        self.managed_objects.borrow_mut().insert(id, object);
    }

    /// The object stored under `id`. Its absence is a broken invariant.
    pub fn get_object(&self, id: ObjectId) -> Rc<dyn Any> {
        match self.get_object_if_exists(id) {
            Some(object) => object,
            None => unreachable!("object {id} is not in the main thread table"),
        }
    }

    pub fn get_object_if_exists(&self, id: ObjectId) -> Option<Rc<dyn Any>> {
        self.managed_objects.borrow().get(&id).cloned()
    }

    pub fn remove_object(&self, id: ObjectId) {
        let removed = self.managed_objects.borrow_mut().remove(&id);
        if removed.is_none() {
            unreachable!("object {id} removed twice");
        }
        // Dropped here, after the table borrow ends
        drop(removed);
    }

    pub fn object_count(&self) -> usize {
        self.managed_objects.borrow().len()
    }
}

impl Drop for MainThreadInterface {
    fn drop(&mut self) {
        self.handle.reset();
    }
}

/// Owning reference, held on another thread, to a main-thread object.
///
/// Creation posts `Create`, [`call`](Self::call) posts `Call`, dropping
/// posts `Delete`. The mailbox is FIFO, so every call runs while the object
/// exists.
pub struct AnotherThreadObjectReference<T> {
    thread: Arc<MainThreadHandle>,
    object_id: ObjectId,
    _object: PhantomData<fn() -> T>,
}

impl<T: 'static> AnotherThreadObjectReference<T> {
    pub fn new(
        thread: Arc<MainThreadHandle>,
        factory: impl FnOnce(&MainThreadInterface) -> T + Send + 'static,
    ) -> Self {
        let object_id = thread.new_object_id();
        thread.post(Request::Create {
            id: object_id,
            factory: Box::new(move |main: &MainThreadInterface| {
                Rc::new(factory(main)) as Rc<dyn Any>
            }),
        });
        Self {
            thread,
            object_id,
            _object: PhantomData,
        }
    }

    pub fn call(&self, f: impl FnOnce(&T) + Send + 'static) -> bool {
        let id = self.object_id;
        self.thread.post(Request::Call {
            id,
            call: Box::new(move |object: &dyn Any| match object.downcast_ref::<T>() {
                Some(object) => f(object),
                None => unreachable!("object {id} has an unexpected type"),
            }),
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }
}

impl<T> Drop for AnotherThreadObjectReference<T> {
    fn drop(&mut self) {
        self.thread.post(Request::Delete {
            id: self.object_id,
        });
    }
}

#[cfg(test)]
#[path = "main_thread_tests.rs"]
mod tests;
