//! Static documentation for the browser events an `{% on %}` tag can bind.
//! Event names are not part of the extracted metadata; this table backs
//! their completion and hover entries.

pub struct EventDoc {
    pub name: &'static str,
    pub doc: &'static str,
}

pub const EVENTS: &[EventDoc] = &[
    EventDoc {
        name: "click",
        doc: "Fired when the element is clicked.",
    },
    EventDoc {
        name: "dblclick",
        doc: "Fired on a double click.",
    },
    EventDoc {
        name: "input",
        doc: "Fired on every change to an input's value.",
    },
    EventDoc {
        name: "change",
        doc: "Fired when an input's value is committed.",
    },
    EventDoc {
        name: "submit",
        doc: "Fired when a form is submitted.",
    },
    EventDoc {
        name: "keydown",
        doc: "Fired when a key is pressed down.",
    },
    EventDoc {
        name: "keyup",
        doc: "Fired when a key is released.",
    },
    EventDoc {
        name: "focus",
        doc: "Fired when the element receives focus.",
    },
    EventDoc {
        name: "blur",
        doc: "Fired when the element loses focus.",
    },
    EventDoc {
        name: "mouseenter",
        doc: "Fired when the pointer enters the element.",
    },
    EventDoc {
        name: "mouseleave",
        doc: "Fired when the pointer leaves the element.",
    },
    EventDoc {
        name: "scroll",
        doc: "Fired when the element is scrolled.",
    },
];

pub fn event_doc(name: &str) -> Option<&'static str> {
    EVENTS
        .iter()
        .find(|event| event.name == name)
        .map(|event| event.doc)
}
