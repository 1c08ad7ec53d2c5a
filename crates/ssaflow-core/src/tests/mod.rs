/*! Test coverage for the instruction graph and its builders.
 *
 * The traversal engine trusts operands, users and function membership blindly, so these tests
 * pin down how the builder wires them for calls, closures, members and phis.
 */
