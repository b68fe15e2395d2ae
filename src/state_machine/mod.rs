pub mod exchange;

/// The [`StateMachine`] trait provides calling semantics for pure, deterministic state machines.
///
/// # Functionality
/// State machines operate on defined inputs and outputs. When there are several kinds of input or
/// output they are grouped into an enum, and the trait provides the dispatch from that enum to the
/// methods that handle each variant.
///
/// The type groupings are provided by the associated types of [`Input`](StateMachine::Input) and
/// [`Output`](StateMachine::Output). Method dispatch is defined by
/// [`process_input`](StateMachine::process_input) and [`poll_output`](StateMachine::poll_output).
///
/// # Invariants
/// A [`StateMachine`] must be pure: its behavior depends only on the inputs it is given.
///
/// ## No Interior Mutability
/// All data is either immutable or mutated through `&mut` access only. No [`std::cell`] types, no
/// [`std::sync`] locks and no reference counted sharing.
///
/// ## No IO, Time or Randomness
/// The state machine never touches sockets, files, the system clock or system entropy. When it
/// needs one of those, the value is provided through [`Input`](StateMachine::Input).
///
/// ## No Concurrency or Async
/// The state machine never spawns threads or tasks and never awaits. The async driver around it
/// (for example the duplex coordinator) owns all scheduling and feeds the machine the outcome.
///
/// # Side Effects
/// Logging is allowed as long as the logic of the state machine never depends on it.
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the first available output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;
}
