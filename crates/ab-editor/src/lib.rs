pub mod error;
pub mod input;
pub mod runners;
pub mod session;
pub mod shortcuts;

pub use error::{EditorError, TransportError};
pub use input::{CanvasController, InputEvent, Modifiers, PointerButton, Response, ViewCommand};
pub use runners::{
    ApiRequest, ApiRun, ApiTransport, CollaboratorConfig, ConnectionTest, ConnectionTester, HttpTransport, QueryExecutor,
    QueryRun, SimulatedExecutor, SimulatedTester, run_api, run_query, test_datasource,
};
pub use session::{Applied, Editor, Mutation, Selection};
pub use shortcuts::{ShortcutAction, ShortcutMap};
